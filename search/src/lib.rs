use anyhow::{Context, Result};
use retrieval::{QueryExpander, ScoredPosting, SearchEngine};
use tracing::warn;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Space-separated doc ids in rank order.
pub fn format_results(results: &[ScoredPosting]) -> String {
    results
        .iter()
        .map(|p| p.doc_id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Answer one query line. Malformed queries are logged and answered with
/// an empty result; index failures abort the run.
pub fn answer<E: QueryExpander>(engine: &SearchEngine<E>, query: &str) -> Result<String> {
    match engine.search(query) {
        Ok(results) => Ok(format_results(&results)),
        Err(e) if e.is_query_error() => {
            warn!(query, error = %e, "skipping malformed query");
            Ok(String::new())
        }
        Err(e) => Err(e).with_context(|| format!("evaluating query {query:?}")),
    }
}

/// Run every line of `queries` and write one result line per query to
/// `output`. Returns the number of queries answered.
pub fn run_search<E: QueryExpander>(engine: &SearchEngine<E>, queries: &Path, output: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(queries).with_context(|| format!("opening {}", queries.display()))?);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);

    let mut answered = 0;
    for line in reader.lines() {
        let line = line?;
        writeln!(writer, "{}", answer(engine, line.trim_end_matches('\r'))?)?;
        answered += 1;
    }
    writer.flush()?;
    Ok(answered)
}
