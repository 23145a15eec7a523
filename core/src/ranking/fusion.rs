use std::collections::BTreeMap;

use crate::config::FusionWeights;
use crate::index::{DocId, ScoredPosting};

use super::{softmax, sort_ranked};

/// Combine the three models for the documents of a boolean result.
///
/// Each input is softmax-normalized on its own, then
/// `boolean * w_b + p_norm * w_p + tf_idf * w_t` is summed per document.
/// Only documents in `boolean` are returned: the ranked models reorder the
/// exact-match set but never add to it.
pub fn fuse(
    boolean: &[ScoredPosting],
    p_norm: &[ScoredPosting],
    tf_idf: &[ScoredPosting],
    weights: &FusionWeights,
) -> Vec<ScoredPosting> {
    let mut fused: BTreeMap<DocId, f64> = BTreeMap::new();
    for p in softmax(boolean) {
        fused.insert(p.doc_id, weights.boolean * p.score);
    }
    for (inputs, weight) in [(p_norm, weights.p_norm), (tf_idf, weights.tf_idf)] {
        for p in softmax(inputs) {
            if let Some(total) = fused.get_mut(&p.doc_id) {
                *total += weight * p.score;
            }
        }
    }
    let mut ranked: Vec<ScoredPosting> = fused.into_iter().map(|(doc_id, score)| ScoredPosting::new(doc_id, score)).collect();
    sort_ranked(&mut ranked);
    ranked
}
