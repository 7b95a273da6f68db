use crate::vectorizer::TermVector;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Cosine similarity between two term vectors.
///
/// Counts are non-negative, so the result lies in `[0, 1]`. Returns exactly
/// `0.0` when either vector has a zero norm; that guards the division and is
/// a defined outcome, not an error. Norms are accumulated as exact integers
/// and the denominator takes a single square root of their product, which
/// keeps `cosine(a, a) == 1.0` exact for any non-empty vector.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let norm_a = norm_sq(a);
    let norm_b = norm_sq(b);
    if norm_a == 0 || norm_b == 0 {
        return 0.0;
    }

    // Walk the smaller map; only intersecting terms contribute.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut dot: u64 = 0;
    for (term, &count) in small {
        if let Some(&other) = large.get(term) {
            dot += u64::from(count) * u64::from(other);
        }
    }
    if dot == 0 {
        return 0.0;
    }

    let denom = ((norm_a as f64) * (norm_b as f64)).sqrt();
    (dot as f64 / denom).min(1.0)
}

fn norm_sq(v: &TermVector) -> u64 {
    v.values().map(|&c| u64::from(c) * u64::from(c)).sum()
}

/// Score every row except `query` against the query row's vector and return
/// the top `k` as `(index, score)` pairs, highest score first.
///
/// Candidates are visited in ascending index order under a stable sort, so
/// equal scores keep ascending index order. `query` must be a valid index
/// into `vectors`.
pub fn top_k(query: usize, vectors: &[TermVector], k: usize) -> Vec<(usize, f64)> {
    let query_vec = &vectors[query];
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(vectors.len().saturating_sub(1));
    for (i, vec) in vectors.iter().enumerate() {
        if i == query {
            continue;
        }
        scored.push((i, cosine(query_vec, vec)));
    }
    rank(&mut scored, k);
    scored
}

/// Same contract as [`top_k`], reading scores out of a precomputed matrix
/// row instead of recomputing them.
pub fn top_k_from_row(query: usize, row: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(row.len().saturating_sub(1));
    for (i, &score) in row.iter().enumerate() {
        if i == query {
            continue;
        }
        scored.push((i, score));
    }
    rank(&mut scored, k);
    scored
}

fn rank(scored: &mut Vec<(usize, f64)>, k: usize) {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
}

/// Dense pairwise similarity scores in catalog row order.
///
/// Build cost is quadratic in time and `8 * n^2` bytes of memory, which only
/// pays off for catalogs small enough that a row lookup per request matters.
/// Larger catalogs should rank on demand with [`top_k`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    n: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn build(vectors: &[TermVector]) -> Self {
        let n = vectors.len();
        let mut scores = vec![0.0; n * n];
        for i in 0..n {
            scores[i * n + i] = cosine(&vectors[i], &vectors[i]);
            for j in (i + 1)..n {
                let s = cosine(&vectors[i], &vectors[j]);
                scores[i * n + j] = s;
                scores[j * n + i] = s;
            }
        }
        Self { n, scores }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.scores[i * self.n..(i + 1) * self.n]
    }
}
