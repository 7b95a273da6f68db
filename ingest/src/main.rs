use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use engine::persist::{
    save_matrix, save_meta, save_records, save_vectors, CatalogMeta, CatalogPaths, CATALOG_VERSION,
};
use engine::{vectorize, MovieRecord, SimilarityMatrix, TermVector};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Matrix precompute is quadratic (8 * n^2 bytes, n^2/2 cosine calls); past
/// this row count on-demand ranking is almost certainly the better deal.
const MATRIX_WARN_ROWS: usize = 5_000;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Build a movie catalog for the recommendation server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalog from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output catalog directory
        #[arg(long)]
        output: String,
        /// Precompute the full pairwise similarity matrix (quadratic in
        /// catalog size; only sensible for small catalogs)
        #[arg(long, default_value_t = false)]
        matrix: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            matrix,
        } => build_catalog(&input, &output, matrix),
    }
}

fn build_catalog(input: &str, output: &str, with_matrix: bool) -> Result<()> {
    let files = collect_input_files(Path::new(input));
    if files.is_empty() {
        bail!("no .json or .jsonl inputs under {input}");
    }

    let mut records: Vec<MovieRecord> = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    report_data_quality(&records);
    tracing::info!(num_movies = records.len(), "ingested movie records");

    let vectors: Vec<TermVector> = records.iter().map(|r| vectorize(&r.tags)).collect();

    let paths = CatalogPaths::new(output);
    save_records(&paths, &records)?;
    save_vectors(&paths, &vectors)?;

    if with_matrix {
        if records.len() > MATRIX_WARN_ROWS {
            tracing::warn!(
                num_movies = records.len(),
                "precomputing a dense similarity matrix for a catalog this size is quadratic; consider on-demand ranking"
            );
        }
        let matrix = SimilarityMatrix::build(&vectors);
        save_matrix(&paths, &matrix)?;
        tracing::info!(num_movies = records.len(), "similarity matrix precomputed");
    }

    let meta = CatalogMeta {
        num_movies: records.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: CATALOG_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "catalog build complete");
    Ok(())
}

fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn read_jsonl(file: &Path, records: &mut Vec<MovieRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: MovieRecord = serde_json::from_str(&line)?;
        records.push(record);
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<MovieRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                records.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => {
            records.push(serde_json::from_value(json)?);
        }
        _ => bail!("{} holds neither a movie object nor an array", file.display()),
    }
    Ok(())
}

fn report_data_quality(records: &[MovieRecord]) {
    let mut seen_titles: HashSet<&str> = HashSet::with_capacity(records.len());
    for record in records {
        if !seen_titles.insert(record.title.as_str()) {
            tracing::warn!(
                title = %record.title,
                "duplicate title; lookups will resolve to the first occurrence"
            );
        }
        if record.tags.trim().is_empty() {
            tracing::warn!(
                title = %record.title,
                "movie has no tags; its similarity to every other movie is 0"
            );
        }
    }
}
