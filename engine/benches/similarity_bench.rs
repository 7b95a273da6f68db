use criterion::{criterion_group, criterion_main, Criterion};
use engine::similarity::top_k;
use engine::vectorizer::{vectorize, TermVector};

// Deterministic synthetic tag blobs, ~32 tokens drawn from a 500-term pool.
fn synthetic_blob(row: usize) -> String {
    let mut tags = String::new();
    for j in 0..32 {
        tags.push_str(&format!("tag{} ", (row * 31 + j * 17) % 500));
    }
    tags
}

fn synthetic_vectors(n: usize) -> Vec<TermVector> {
    (0..n).map(|i| vectorize(&synthetic_blob(i))).collect()
}

fn bench_vectorize(c: &mut Criterion) {
    let blob = synthetic_blob(7);
    c.bench_function("vectorize_32_tokens", |b| b.iter(|| vectorize(&blob)));
}

fn bench_top_k(c: &mut Criterion) {
    let vectors = synthetic_vectors(2_000);
    c.bench_function("top_k_2000_rows", |b| b.iter(|| top_k(0, &vectors, 5)));
}

criterion_group!(benches, bench_vectorize, bench_top_k);
criterion_main!(benches);
