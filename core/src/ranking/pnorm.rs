use std::collections::{BTreeMap, HashMap};

use crate::config::RankingConfig;
use crate::index::{log10_or_zero, DocId, ScoredPosting};
use crate::reader::IndexReader;

/// Scored postings of one literal query operand, keyed by its text.
pub type ResolvedOperand = (String, Vec<ScoredPosting>);

/// Conjunctive p-norm similarity
/// `1 - (Σ a_i^p (1 - d_i)^p / Σ a_i^p)^(1/p)` for every document in
/// `documents`. A term missing from a document has `d_i = 0`.
pub fn similarities(
    query: &[(String, f64)],
    documents: &BTreeMap<DocId, HashMap<String, f64>>,
    p: f64,
) -> Vec<ScoredPosting> {
    let denominator: f64 = query.iter().map(|(_, a)| a.powf(p)).sum();
    if denominator <= 0.0 {
        return Vec::new();
    }
    documents
        .iter()
        .map(|(&doc_id, weights)| {
            let numerator: f64 = query
                .iter()
                .map(|(term, a)| {
                    let d = weights.get(term).copied().unwrap_or(0.0).clamp(0.0, 1.0);
                    a.powf(p) * (1.0 - d).powf(p)
                })
                .sum();
            ScoredPosting::new(doc_id, 1.0 - (numerator / denominator).powf(1.0 / p))
        })
        .collect()
}

/// Query weights `a_i`: idf of each operand (floored for operands with no
/// matching documents), or uniform 1.0.
pub fn query_weights(index: &IndexReader, operands: &[ResolvedOperand], config: &RankingConfig) -> Vec<(String, f64)> {
    let n = index.dictionary().document_count() as f64;
    operands
        .iter()
        .map(|(key, postings)| {
            let weight = if !config.idf_query_weights {
                1.0
            } else if postings.is_empty() || n == 0.0 {
                config.idf_floor
            } else {
                log10_or_zero(n / postings.len() as f64)
            };
            (key.clone(), weight)
        })
        .collect()
}

/// Document weights `d_i`: each operand's log-tf over the document's
/// normalized length.
pub fn document_weights(index: &IndexReader, operands: &[ResolvedOperand]) -> BTreeMap<DocId, HashMap<String, f64>> {
    let mut documents: BTreeMap<DocId, HashMap<String, f64>> = BTreeMap::new();
    for (key, postings) in operands {
        for p in postings {
            if let Some(weight) = index.document_weight(p.doc_id, p.score) {
                documents.entry(p.doc_id).or_default().insert(key.clone(), weight);
            }
        }
    }
    documents
}

/// p-norm similarity of every document matching at least one operand.
pub fn score(index: &IndexReader, operands: &[ResolvedOperand], config: &RankingConfig) -> Vec<ScoredPosting> {
    let query = query_weights(index, operands, config);
    let documents = document_weights(index, operands);
    similarities(&query, &documents, config.p)
}
