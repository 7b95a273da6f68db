use crate::similarity::{top_k, top_k_from_row, SimilarityMatrix};
use crate::vectorizer::{vectorize, TermVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type MovieId = u32;

/// One catalog row. `movie_id` is the external TMDB key, `tags` the raw
/// space-delimited token blob similarity is computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    pub tags: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("title not found: {0}")]
    TitleNotFound(String),
}

/// In-memory catalog: rows in load order, derived term vectors, lookup maps,
/// and optionally a precomputed similarity matrix. Read-only once built.
#[derive(Debug)]
pub struct Catalog {
    records: Vec<MovieRecord>,
    vectors: Vec<TermVector>,
    by_title: HashMap<String, usize>,
    by_movie_id: HashMap<MovieId, usize>,
    matrix: Option<SimilarityMatrix>,
}

impl Catalog {
    /// Build a catalog straight from records, deriving every term vector.
    pub fn from_records(records: Vec<MovieRecord>) -> Self {
        let vectors = records.iter().map(|r| vectorize(&r.tags)).collect();
        Self::from_parts(records, vectors, None)
    }

    /// Assemble a catalog from already-derived parts. Rows keep their load
    /// order; duplicate titles resolve to the first occurrence and later
    /// duplicates stay in the candidate pool.
    pub fn from_parts(
        records: Vec<MovieRecord>,
        vectors: Vec<TermVector>,
        matrix: Option<SimilarityMatrix>,
    ) -> Self {
        debug_assert_eq!(records.len(), vectors.len());
        let mut by_title: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut by_movie_id: HashMap<MovieId, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if let Some(&first) = by_title.get(&record.title) {
                tracing::warn!(
                    title = %record.title,
                    first,
                    duplicate = i,
                    "duplicate title; lookups resolve to the first row"
                );
            } else {
                by_title.insert(record.title.clone(), i);
            }
            by_movie_id.entry(record.movie_id).or_insert(i);
        }
        Self {
            records,
            vectors,
            by_title,
            by_movie_id,
            matrix,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&MovieRecord> {
        self.records.get(index)
    }

    pub fn vectors(&self) -> &[TermVector] {
        &self.vectors
    }

    pub fn vector(&self, index: usize) -> Option<&TermVector> {
        self.vectors.get(index)
    }

    /// Titles in catalog row order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.title.as_str())
    }

    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }

    pub fn record_by_movie_id(&self, movie_id: MovieId) -> Option<&MovieRecord> {
        self.by_movie_id.get(&movie_id).map(|&i| &self.records[i])
    }

    pub fn has_matrix(&self) -> bool {
        self.matrix.is_some()
    }

    /// Rank every other row against `title`'s tag vector and return the top
    /// `k` as `(row index, score)` pairs. Reads the precomputed matrix row
    /// when one was built, otherwise scores on demand; both paths produce
    /// identical output.
    pub fn recommend(&self, title: &str, k: usize) -> Result<Vec<(usize, f64)>, CatalogError> {
        let query = self
            .index_of_title(title)
            .ok_or_else(|| CatalogError::TitleNotFound(title.to_string()))?;
        Ok(match &self.matrix {
            Some(matrix) => top_k_from_row(query, matrix.row(query), k),
            None => top_k(query, &self.vectors, k),
        })
    }
}
