use serde::{Deserialize, Serialize};

pub type DocId = u32;
pub type Position = u32;

/// Reserved term whose posting list holds every document once. The tokenizer
/// never emits `$`, so no query term can collide with it.
pub const ALL_DOCS: &str = "$all_docs$";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub positions: Vec<Position>, // ascending, one per occurrence
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<Position>) -> Self {
        Self { doc_id, positions }
    }

    pub fn tf(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// A (document, score) pair in an evaluated result list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosting {
    pub doc_id: DocId,
    pub score: f64,
}

impl ScoredPosting {
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Self { doc_id, score }
    }
}

/// Postings of one term, ascending by doc id, with the forward pointers
/// assigned when the list was flushed. `skips[i]` is the index to jump to
/// from `i`, always greater than `i` and less than `len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingList {
    postings: Vec<Posting>,
    skips: Vec<Option<u32>>,
}

impl PostingList {
    /// Build a list and assign its skip pointers. `postings` must already be
    /// sorted by doc id without duplicates.
    pub fn with_min_stride(postings: Vec<Posting>, min_stride: usize) -> Self {
        debug_assert!(postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
        let skips = assign_skips(postings.len(), min_stride);
        Self { postings, skips }
    }

    /// Reassemble a list read back from disk. Callers validate the parts.
    pub(crate) fn from_parts(postings: Vec<Posting>, skips: Vec<Option<u32>>) -> Self {
        Self { postings, skips }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn skips(&self) -> &[Option<u32>] {
        &self.skips
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Score every posting with `1 + log10(tf * weight(doc))`.
    pub fn log_tf_scores<F>(&self, weight: F) -> Vec<ScoredPosting>
    where
        F: Fn(DocId) -> f64,
    {
        self.postings
            .iter()
            .map(|p| ScoredPosting::new(p.doc_id, log_tf(p.tf() as f64 * weight(p.doc_id))))
            .collect()
    }
}

/// `floor(sqrt(len))`, or 0 when that falls below `min_stride`.
pub fn skip_stride(len: usize, min_stride: usize) -> usize {
    let stride = (len as f64).sqrt().floor() as usize;
    if stride == 0 || stride < min_stride { 0 } else { stride }
}

/// Forward pointers at every stride multiple: index 0 points at `stride`,
/// `stride` at `2 * stride`, and so on. Targets past the end stay `None`.
pub fn assign_skips(len: usize, min_stride: usize) -> Vec<Option<u32>> {
    let mut skips = vec![None; len];
    let stride = skip_stride(len, min_stride);
    if stride == 0 {
        return skips;
    }
    for i in (0..len).step_by(stride) {
        let target = i + stride;
        if target < len {
            skips[i] = Some(target as u32);
        }
    }
    skips
}

/// `log10(x)` for positive input, zero otherwise.
pub fn log10_or_zero(x: f64) -> f64 {
    if x > 0.0 { x.log10() } else { 0.0 }
}

/// Log-dampened term frequency `1 + log10(tf)`.
pub fn log_tf(tf: f64) -> f64 {
    1.0 + log10_or_zero(tf)
}
