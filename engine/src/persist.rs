use crate::catalog::{Catalog, MovieRecord};
use crate::similarity::SimilarityMatrix;
use crate::vectorizer::TermVector;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogMeta {
    pub num_movies: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct CatalogPaths {
    pub root: PathBuf,
}

impl CatalogPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    fn records(&self) -> PathBuf {
        self.root.join("records.bin")
    }
    fn vectors(&self) -> PathBuf {
        self.root.join("vectors.bin")
    }
    fn matrix(&self) -> PathBuf {
        self.root.join("matrix.bin")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    pub fn has_matrix(&self) -> bool {
        self.matrix().exists()
    }
}

pub fn save_records(paths: &CatalogPaths, records: &[MovieRecord]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.records())?;
    let bytes = bincode::serialize(records)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_records(paths: &CatalogPaths) -> Result<Vec<MovieRecord>> {
    let mut f = File::open(paths.records())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let records = bincode::deserialize(&buf)?;
    Ok(records)
}

pub fn save_vectors(paths: &CatalogPaths, vectors: &[TermVector]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.vectors())?;
    let bytes = bincode::serialize(vectors)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_vectors(paths: &CatalogPaths) -> Result<Vec<TermVector>> {
    let mut f = File::open(paths.vectors())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let vectors = bincode::deserialize(&buf)?;
    Ok(vectors)
}

pub fn save_matrix(paths: &CatalogPaths, matrix: &SimilarityMatrix) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.matrix())?;
    let bytes = bincode::serialize(matrix)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_matrix(paths: &CatalogPaths) -> Result<SimilarityMatrix> {
    let mut f = File::open(paths.matrix())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let matrix = bincode::deserialize(&buf)?;
    Ok(matrix)
}

pub fn save_meta(paths: &CatalogPaths, meta: &CatalogMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &CatalogPaths) -> Result<CatalogMeta> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: CatalogMeta = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Load everything serving needs: records, vectors, meta, and the
/// precomputed matrix when one was built. Rejects artifacts whose version
/// or cross-file lengths disagree; a mismatch would otherwise surface as an
/// index panic mid-request.
pub fn load_catalog(paths: &CatalogPaths) -> Result<Catalog> {
    let meta = load_meta(paths)?;
    ensure!(
        meta.version == CATALOG_VERSION,
        "unsupported catalog version {} (expected {})",
        meta.version,
        CATALOG_VERSION
    );
    let records = load_records(paths)?;
    let vectors = load_vectors(paths)?;
    ensure!(
        records.len() == vectors.len(),
        "catalog corrupt: {} records but {} vectors",
        records.len(),
        vectors.len()
    );
    ensure!(
        records.len() == meta.num_movies as usize,
        "catalog corrupt: meta says {} movies, records hold {}",
        meta.num_movies,
        records.len()
    );
    let matrix = if paths.has_matrix() {
        let matrix = load_matrix(paths)?;
        ensure!(
            matrix.len() == records.len(),
            "catalog corrupt: matrix is {}x{} for {} records",
            matrix.len(),
            matrix.len(),
            records.len()
        );
        Some(matrix)
    } else {
        None
    };
    Ok(Catalog::from_parts(records, vectors, matrix))
}
