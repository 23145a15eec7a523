use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::IndexerConfig;
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::index::{log_tf, DocId, Position, Posting, PostingList, ALL_DOCS};
use crate::persist::{encode_posting_list, PostingsWriter};

/// In-memory accumulator for one build pass. Nothing is queryable until
/// [`Indexer::flush`] has written every list and returned the dictionary.
pub struct Indexer {
    config: IndexerConfig,
    postings: BTreeMap<String, BTreeMap<DocId, Vec<Position>>>,
    dictionary: Dictionary,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config, postings: BTreeMap::new(), dictionary: Dictionary::new() }
    }

    /// Add one document's normalized terms; term `i` is at position `i`.
    /// Returns false (and indexes nothing) if `doc_id` was already added.
    pub fn add_document<I, S>(&mut self, doc_id: DocId, terms: I, importance_weight: f64) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.dictionary.contains_document(doc_id) {
            warn!(doc_id, "duplicate document id, keeping the first occurrence");
            return false;
        }

        let mut tf_counts: HashMap<String, u32> = HashMap::new();
        for (pos, term) in terms.into_iter().enumerate() {
            let term: String = term.into();
            *tf_counts.entry(term.clone()).or_insert(0) += 1;
            self.postings
                .entry(term)
                .or_default()
                .entry(doc_id)
                .or_default()
                .push(pos as Position);
        }
        self.postings.entry(ALL_DOCS.to_string()).or_default().insert(doc_id, vec![0]);

        let normalized_length = tf_counts
            .values()
            .map(|&tf| log_tf(tf as f64 * importance_weight).powi(2))
            .sum::<f64>()
            .sqrt();
        self.dictionary.record_document(doc_id, normalized_length, importance_weight);
        debug!(doc_id, distinct_terms = tf_counts.len(), normalized_length, "indexed document");
        true
    }

    pub fn document_count(&self) -> u32 {
        self.dictionary.document_count()
    }

    /// Write every posting list in lexicographic term order, assigning skip
    /// pointers as each list is serialized.
    pub fn flush<P: AsRef<Path>>(self, postings_path: P) -> Result<Dictionary> {
        let Indexer { config, postings, mut dictionary } = self;
        let mut writer = PostingsWriter::create(postings_path)?;

        for (term, docs) in postings {
            let list = PostingList::with_min_stride(
                docs.into_iter().map(|(doc_id, positions)| Posting::new(doc_id, positions)).collect(),
                config.min_skip_stride,
            );
            dictionary.add_term(&term, list.len() as u32, writer.offset());
            let bytes = encode_posting_list(&list)?;
            let offset = writer.append(&bytes)?;
            dictionary.update_offset_and_size(&term, offset, bytes.len() as u64)?;
        }

        let total_bytes = writer.finish()?;
        info!(
            num_docs = dictionary.document_count(),
            num_terms = dictionary.vocabulary().count(),
            total_bytes,
            "flushed postings"
        );
        Ok(dictionary)
    }

    /// Flush postings, then persist the dictionary.
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(self, dictionary_path: P, postings_path: Q) -> Result<Dictionary> {
        let dictionary = self.flush(postings_path)?;
        dictionary.save(dictionary_path)?;
        Ok(dictionary)
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new(IndexerConfig::default())
    }
}
