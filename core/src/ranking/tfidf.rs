use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::Result;
use crate::expansion::WeightedTerm;
use crate::index::{log_tf, DocId, ScoredPosting};
use crate::reader::IndexReader;

/// Raw query term frequencies, keyed by normalized term.
pub type QueryVector = BTreeMap<String, f64>;

/// Sum the weights of repeated terms into a query vector.
pub fn query_vector(terms: &[WeightedTerm]) -> QueryVector {
    let mut vector = QueryVector::new();
    for t in terms {
        *vector.entry(t.term.clone()).or_insert(0.0) += t.weight;
    }
    vector
}

/// lnc.ltc cosine scores of every document sharing a term with `query`.
///
/// Query weight is `idf * (1 + log10(tf))`, document weight is the stored
/// log-tf over the document's normalized length. Unknown terms contribute
/// nothing; a zero-length query vector scores no documents.
pub fn score(index: &IndexReader, query: &QueryVector) -> Result<HashMap<DocId, f64>> {
    let dictionary = index.dictionary();
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    let mut norm = 0.0f64;

    for (term, &q_tf) in query {
        if dictionary.doc_frequency(term).is_none() {
            continue;
        }
        let wt = dictionary.idf(term) * log_tf(q_tf);
        norm += wt * wt;
        if wt == 0.0 {
            continue;
        }
        let list = index.posting_list(term)?;
        for posting in index.scored(&list) {
            if let Some(doc_wt) = index.document_weight(posting.doc_id, posting.score) {
                *scores.entry(posting.doc_id).or_insert(0.0) += wt * doc_wt;
            }
        }
    }

    let norm = norm.sqrt();
    if norm == 0.0 {
        return Ok(HashMap::new());
    }
    for s in scores.values_mut() {
        *s /= norm;
    }
    debug!(terms = query.len(), hits = scores.len(), "tf-idf scored");
    Ok(scores)
}

/// Top `k` documents by tf-idf score; all of them when `k` is `None`.
pub fn rank(index: &IndexReader, query: &QueryVector, k: Option<usize>) -> Result<Vec<ScoredPosting>> {
    Ok(super::top_k(score(index, query)?, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_terms_accumulate() {
        let terms = vec![
            WeightedTerm::new("damag", 1.0),
            WeightedTerm::new("harm", 0.5),
            WeightedTerm::new("damag", 1.0),
        ];
        let vector = query_vector(&terms);
        assert_eq!(vector.get("damag"), Some(&2.0));
        assert_eq!(vector.get("harm"), Some(&0.5));
    }
}
