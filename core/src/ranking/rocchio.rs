use std::collections::{BTreeMap, BTreeSet, HashMap};

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::config::RocchioConfig;
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::index::DocId;
use crate::reader::IndexReader;

use super::tfidf::QueryVector;

/// Sparse term weights of one document.
pub type DocumentVector = HashMap<String, f64>;

/// Importance-weighted log-tf vectors of `docs`, read term by term from
/// the postings file.
pub fn document_vectors(index: &IndexReader, docs: &BTreeSet<DocId>) -> Result<BTreeMap<DocId, DocumentVector>> {
    let mut vectors: BTreeMap<DocId, DocumentVector> = BTreeMap::new();
    if docs.is_empty() {
        return Ok(vectors);
    }
    for (term, _) in index.dictionary().vocabulary() {
        let list = index.posting_list(term)?;
        for posting in index.scored(&list) {
            if docs.contains(&posting.doc_id) {
                vectors.entry(posting.doc_id).or_default().insert(term.to_string(), posting.score);
            }
        }
    }
    Ok(vectors)
}

struct Centroid {
    sums: HashMap<String, f64>,
    norm: f64,
}

impl Centroid {
    fn of(vectors: &[&DocumentVector]) -> Self {
        let mut sums: HashMap<String, f64> = HashMap::new();
        for v in vectors {
            for (term, w) in v.iter() {
                *sums.entry(term.clone()).or_insert(0.0) += w;
            }
        }
        let n = vectors.len().max(1) as f64;
        let norm = sums.values().map(|s| (s / n).powi(2)).sum::<f64>().sqrt();
        Self { sums, norm }
    }

    /// `Σ d[t] / ‖centroid‖`, zero when the centroid is empty.
    fn weight(&self, term: &str) -> f64 {
        match self.sums.get(term) {
            Some(sum) if self.norm > 0.0 => sum / self.norm,
            _ => 0.0,
        }
    }
}

/// One Rocchio revision of `query`.
///
/// Candidate terms are the query terms, the `expansion_terms`
/// highest-idf terms of the relevant documents, and every term of the
/// non-relevant documents. Terms whose revised weight is not positive are
/// dropped.
pub fn revise(
    query: &QueryVector,
    relevant: &[&DocumentVector],
    non_relevant: &[&DocumentVector],
    dictionary: &Dictionary,
    config: &RocchioConfig,
) -> QueryVector {
    let rel = Centroid::of(relevant);
    let non_rel = Centroid::of(non_relevant);

    let mut expansion: Vec<&String> = rel.sums.keys().collect();
    expansion.sort_by(|a, b| {
        OrderedFloat(dictionary.idf(b))
            .cmp(&OrderedFloat(dictionary.idf(a)))
            .then_with(|| a.cmp(b))
    });
    expansion.truncate(config.expansion_terms);

    let candidates: BTreeSet<&str> = query
        .keys()
        .map(String::as_str)
        .chain(expansion.into_iter().map(String::as_str))
        .chain(non_rel.sums.keys().map(String::as_str))
        .collect();

    let mut revised = QueryVector::new();
    for term in candidates {
        let original = query.get(term).copied().unwrap_or(0.0);
        let weight = config.alpha * original + config.beta * rel.weight(term) - config.gamma * non_rel.weight(term);
        if weight > 0.0 {
            revised.insert(term.to_string(), weight);
        }
    }
    debug!(before = query.len(), after = revised.len(), "rocchio revision");
    revised
}

/// Read the feedback documents from the index and revise `query`.
pub fn feedback(
    index: &IndexReader,
    query: &QueryVector,
    relevant: &[DocId],
    non_relevant: &[DocId],
    config: &RocchioConfig,
) -> Result<QueryVector> {
    let wanted: BTreeSet<DocId> = relevant.iter().chain(non_relevant).copied().collect();
    let vectors = document_vectors(index, &wanted)?;
    let relevant: Vec<&DocumentVector> = relevant.iter().filter_map(|d| vectors.get(d)).collect();
    let non_relevant: Vec<&DocumentVector> = non_relevant.iter().filter_map(|d| vectors.get(d)).collect();
    Ok(revise(query, &relevant, &non_relevant, index.dictionary(), config))
}
