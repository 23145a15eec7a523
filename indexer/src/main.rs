mod authority;
mod ingest;

use anyhow::{Context, Result};
use clap::Parser;
use retrieval::config::DEFAULT_MIN_SKIP_STRIDE;
use retrieval::tokenizer::tokenize;
use retrieval::{Indexer, IndexerConfig};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional inverted index with skip pointers", long_about = None)]
struct Args {
    /// Input path: a JSON, JSONL or CSV file, or a directory
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
    /// Output dictionary file
    #[arg(short = 'd', long = "dictionary")]
    dictionary: PathBuf,
    /// Output postings file
    #[arg(short = 'p', long = "postings")]
    postings: PathBuf,
    /// Posting lists whose sqrt-length stride falls below this get no skip pointers
    #[arg(long, default_value_t = DEFAULT_MIN_SKIP_STRIDE)]
    min_skip_stride: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    build_index(&args)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn build_index(args: &Args) -> Result<()> {
    let mut indexer = Indexer::new(IndexerConfig { min_skip_stride: args.min_skip_stride });
    let mut duplicates = 0usize;

    ingest::for_each_document(&args.input, |doc| {
        let weight = authority::importance_weight(doc.court.as_deref());
        if !indexer.add_document(doc.doc_id, tokenize(&doc.text), weight) {
            duplicates += 1;
        }
        Ok(())
    })?;
    tracing::info!(num_docs = indexer.document_count(), duplicates, "ingested documents");

    ensure_parent(&args.dictionary)?;
    ensure_parent(&args.postings)?;
    let dictionary = indexer
        .build(&args.dictionary, &args.postings)
        .context("writing index")?;

    tracing::info!(
        dictionary = %args.dictionary.display(),
        postings = %args.postings.display(),
        num_terms = dictionary.len(),
        "index build complete"
    );
    Ok(())
}
