use anyhow::{Context, Result};
use clap::Parser;
use retrieval::{SearchConfig, SearchEngine};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Run a file of queries against a built index", long_about = None)]
struct Args {
    /// Dictionary file written by the indexer
    #[arg(short = 'd', long = "dictionary")]
    dictionary: PathBuf,
    /// Postings file written by the indexer
    #[arg(short = 'p', long = "postings")]
    postings: PathBuf,
    /// Query file, one query per line
    #[arg(short = 'q', long = "queries")]
    queries: PathBuf,
    /// Results file, one line of doc ids per query
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
    /// JSON ranking configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Result cutoff for free-text queries
    #[arg(long)]
    top_k: Option<usize>,
    /// Pseudo-relevance feedback from the top N free-text results (0 disables)
    #[arg(long)]
    feedback: Option<usize>,
}

fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(k) = args.top_k {
        config.ranking.top_k = k;
    }
    if let Some(n) = args.feedback {
        config.ranking.rocchio.feedback_docs = n;
    }
    Ok(config)
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let engine = SearchEngine::open(&args.dictionary, &args.postings, config).context("opening index")?;
    let answered = search::run_search(&engine, &args.queries, &args.output)?;
    tracing::info!(answered, output = %args.output.display(), "search complete");
    Ok(())
}
