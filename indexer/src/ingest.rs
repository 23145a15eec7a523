//! Reading source documents from JSON, JSONL, CSV or a directory of plain
//! text files named by their numeric doc id.

use anyhow::{bail, Context, Result};
use retrieval::DocId;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One document ready for tokenization.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub doc_id: DocId,
    /// Title, content, date and court joined by spaces
    pub text: String,
    pub court: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    document_id: RawId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    date_posted: String,
    #[serde(default)]
    court: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    document_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    date_posted: String,
    #[serde(default)]
    court: Option<String>,
}

fn parse_doc_id(raw: RawId) -> Result<DocId> {
    match raw {
        RawId::Number(n) => DocId::try_from(n).with_context(|| format!("document id {n} out of range")),
        RawId::Text(s) => s.trim().parse().with_context(|| format!("document id {s:?} is not a number")),
    }
}

fn join_fields(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl TryFrom<InputDoc> for SourceDocument {
    type Error = anyhow::Error;

    fn try_from(doc: InputDoc) -> Result<Self> {
        let court = doc.court.filter(|c| !c.trim().is_empty());
        let text = join_fields(&[&doc.title, &doc.content, &doc.date_posted, court.as_deref().unwrap_or("")]);
        Ok(Self { doc_id: parse_doc_id(doc.document_id)?, text, court })
    }
}

impl TryFrom<CsvRow> for SourceDocument {
    type Error = anyhow::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        InputDoc {
            document_id: RawId::Text(row.document_id),
            title: row.title,
            content: row.content,
            date_posted: row.date_posted,
            court: row.court,
        }
        .try_into()
    }
}

/// Call `visit` for every document under `input`, in file order. Duplicate
/// ids are passed through; the index keeps the first one it sees.
pub fn for_each_document<F>(input: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(SourceDocument) -> Result<()>,
{
    if input.is_file() {
        return read_file(input, &mut visit);
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }

    let mut structured: Vec<PathBuf> = Vec::new();
    let mut plain: Vec<(DocId, PathBuf)> = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        match extension(p) {
            Some("json" | "jsonl" | "csv") => structured.push(p.to_path_buf()),
            _ => match p.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse::<DocId>().ok()) {
                Some(doc_id) => plain.push((doc_id, p.to_path_buf())),
                None => debug!(path = %p.display(), "skipping file without a numeric name"),
            },
        }
    }

    for file in structured {
        read_file(&file, &mut visit)?;
    }
    plain.sort_by_key(|(doc_id, _)| *doc_id);
    for (doc_id, path) in plain {
        let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        visit(SourceDocument { doc_id, text, court: None })?;
    }
    Ok(())
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_file<F>(file: &Path, visit: &mut F) -> Result<()>
where
    F: FnMut(SourceDocument) -> Result<()>,
{
    let result = match extension(file) {
        Some("jsonl") => read_jsonl(file, visit),
        Some("csv") => read_csv(file, visit),
        Some("json") => read_json(file, visit),
        _ => bail!("unsupported input file {}", file.display()),
    };
    result.with_context(|| format!("ingesting {}", file.display()))
}

fn read_jsonl<F>(file: &Path, visit: &mut F) -> Result<()>
where
    F: FnMut(SourceDocument) -> Result<()>,
{
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        visit(doc.try_into()?)?;
    }
    Ok(())
}

fn read_json<F>(file: &Path, visit: &mut F) -> Result<()>
where
    F: FnMut(SourceDocument) -> Result<()>,
{
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                visit(doc.try_into()?)?;
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            visit(doc.try_into()?)?;
        }
        _ => warn!(path = %file.display(), "expected a JSON object or array, skipping"),
    }
    Ok(())
}

fn read_csv<F>(file: &Path, visit: &mut F) -> Result<()>
where
    F: FnMut(SourceDocument) -> Result<()>,
{
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(file)?;
    for row in reader.deserialize::<CsvRow>() {
        visit(row?.try_into()?)?;
    }
    Ok(())
}
