//! Relevance ranking over the frozen index.
//!
//! - [`tfidf`]: lnc.ltc vector-space scoring
//! - [`pnorm`]: extended boolean p-norm similarity
//! - [`fusion`]: softmax-normalized weighted sum of the above with boolean scores
//! - [`rocchio`]: one round of query revision from relevance feedback

pub mod fusion;
pub mod pnorm;
pub mod rocchio;
pub mod tfidf;

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::index::{DocId, ScoredPosting};

/// Heap key: higher score first, then lower doc id.
type RankKey = (OrderedFloat<f64>, Reverse<DocId>);

fn rank_key(p: &ScoredPosting) -> RankKey {
    (OrderedFloat(p.score), Reverse(p.doc_id))
}

/// Sort descending by score, ties broken by ascending doc id.
pub fn sort_ranked(results: &mut [ScoredPosting]) {
    results.sort_unstable_by(|a, b| rank_key(b).cmp(&rank_key(a)));
}

/// The `k` best documents in rank order, or all of them when `k` is `None`.
pub fn top_k(scores: HashMap<DocId, f64>, k: Option<usize>) -> Vec<ScoredPosting> {
    let candidates = scores.into_iter().map(|(doc_id, score)| ScoredPosting::new(doc_id, score));
    let mut results: Vec<ScoredPosting> = match k {
        None => candidates.collect(),
        Some(k) => {
            // Partial sort: O(n log k) via min-heap of size k
            let mut heap: BinaryHeap<Reverse<RankKey>> = BinaryHeap::with_capacity(k + 1);
            for p in candidates {
                heap.push(Reverse(rank_key(&p)));
                if heap.len() > k {
                    heap.pop();
                }
            }
            heap.into_iter()
                .map(|Reverse((score, Reverse(doc_id)))| ScoredPosting::new(doc_id, score.0))
                .collect()
        }
    };
    sort_ranked(&mut results);
    results
}

/// Softmax over the scores of one model, keeping doc order.
pub fn softmax(scores: &[ScoredPosting]) -> Vec<ScoredPosting> {
    let max = scores.iter().map(|p| p.score).fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|p| (p.score - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    scores
        .iter()
        .zip(exp)
        .map(|(p, e)| ScoredPosting::new(p.doc_id, e / sum))
        .collect()
}
