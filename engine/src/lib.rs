pub mod catalog;
pub mod persist;
pub mod similarity;
pub mod vectorizer;

pub use catalog::{Catalog, CatalogError, MovieId, MovieRecord};
pub use similarity::{cosine, top_k, top_k_from_row, SimilarityMatrix};
pub use vectorizer::{vectorize, TermVector};
