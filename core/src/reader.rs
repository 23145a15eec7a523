use std::path::Path;

use tracing::info;

use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::index::{DocId, PostingList, ScoredPosting, ALL_DOCS};
use crate::persist::PostingsReader;

/// A frozen index opened for querying: the whole dictionary in memory plus
/// random-access reads into the postings file.
#[derive(Debug, Clone)]
pub struct IndexReader {
    dictionary: Dictionary,
    postings: PostingsReader,
}

impl IndexReader {
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(dictionary_path: P, postings_path: Q) -> Result<Self> {
        let dictionary = Dictionary::load(dictionary_path)?;
        let postings = PostingsReader::open(postings_path)?;
        info!(num_docs = dictionary.document_count(), num_terms = dictionary.len(), "loaded index");
        Ok(Self { dictionary, postings })
    }

    pub fn new(dictionary: Dictionary, postings: PostingsReader) -> Self {
        Self { dictionary, postings }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Posting list of `term`; a dictionary miss is an empty list, not an error.
    pub fn posting_list(&self, term: &str) -> Result<PostingList> {
        match self.dictionary.entry(term) {
            Some(entry) => self.postings.read_posting_list(entry),
            None => Ok(PostingList::empty()),
        }
    }

    /// Every document in the collection, used as the identity for NOT.
    pub fn universe(&self) -> Result<Vec<ScoredPosting>> {
        Ok(self.scored(&self.posting_list(ALL_DOCS)?))
    }

    /// Log-tf scores with each document's importance weight applied first.
    pub fn scored(&self, list: &PostingList) -> Vec<ScoredPosting> {
        list.log_tf_scores(|doc| self.dictionary.importance_weight(doc))
    }

    /// Length-normalized document weight of a log-tf score, or `None` for
    /// documents with no recorded length.
    pub fn document_weight(&self, doc_id: DocId, log_tf: f64) -> Option<f64> {
        self.dictionary
            .normalized_length(doc_id)
            .filter(|len| *len > 0.0)
            .map(|len| log_tf / len)
    }
}
