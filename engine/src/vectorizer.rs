use std::collections::HashMap;

/// Sparse token-count representation of a tag blob.
pub type TermVector = HashMap<String, u32>;

/// Split a tag blob on whitespace and count token occurrences.
///
/// Tokens are taken verbatim: no case folding, stemming, or punctuation
/// stripping, so `Action` and `action` are distinct terms. Catalogs are
/// expected to carry pre-cleaned tag blobs.
pub fn vectorize(tags: &str) -> TermVector {
    let mut counts = TermVector::new();
    for token in tags.split_whitespace() {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}
