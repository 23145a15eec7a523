use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SearchError};
use crate::index::{log10_or_zero, DocId, ALL_DOCS};
use crate::persist;

/// Where a term's posting list lives in the postings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub doc_freq: u32,
    pub offset: u64,
    pub size: u64,
}

/// Term metadata and collection statistics, loaded whole for a query session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    terms: BTreeMap<String, TermEntry>,
    normalized_lengths: BTreeMap<DocId, f64>,
    importance_weights: BTreeMap<DocId, f64>,
    num_docs: u32,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, term: &str, doc_freq: u32, offset: u64) {
        self.terms.insert(term.to_string(), TermEntry { doc_freq, offset, size: 0 });
    }

    pub fn update_offset_and_size(&mut self, term: &str, offset: u64, size: u64) -> Result<()> {
        let entry = self
            .terms
            .get_mut(term)
            .ok_or_else(|| SearchError::UnknownTerm(term.to_string()))?;
        entry.offset = offset;
        entry.size = size;
        Ok(())
    }

    pub fn entry(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    pub fn offset_and_size(&self, term: &str) -> Option<(u64, u64)> {
        self.terms.get(term).map(|e| (e.offset, e.size))
    }

    pub fn doc_frequency(&self, term: &str) -> Option<u32> {
        self.terms.get(term).map(|e| e.doc_freq)
    }

    /// `log10(N / df)`; zero for unknown terms or an empty collection.
    pub fn idf(&self, term: &str) -> f64 {
        match self.doc_frequency(term) {
            Some(df) if df > 0 && self.num_docs > 0 => log10_or_zero(self.num_docs as f64 / df as f64),
            _ => 0.0,
        }
    }

    /// Record a document once, at index time. Returns false if the id was
    /// already recorded.
    pub fn record_document(&mut self, doc_id: DocId, normalized_length: f64, importance_weight: f64) -> bool {
        if self.normalized_lengths.contains_key(&doc_id) {
            return false;
        }
        self.normalized_lengths.insert(doc_id, normalized_length);
        if importance_weight != 1.0 {
            self.importance_weights.insert(doc_id, importance_weight);
        }
        self.num_docs += 1;
        true
    }

    pub fn contains_document(&self, doc_id: DocId) -> bool {
        self.normalized_lengths.contains_key(&doc_id)
    }

    pub fn document_count(&self) -> u32 {
        self.num_docs
    }

    pub fn normalized_length(&self, doc_id: DocId) -> Option<f64> {
        self.normalized_lengths.get(&doc_id).copied()
    }

    pub fn importance_weight(&self, doc_id: DocId) -> f64 {
        self.importance_weights.get(&doc_id).copied().unwrap_or(1.0)
    }

    /// Number of entries including the universe term.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Real vocabulary in lexicographic order, without the universe term.
    pub fn vocabulary(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms
            .iter()
            .filter(|(term, _)| term.as_str() != ALL_DOCS)
            .map(|(term, entry)| (term.as_str(), entry))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save_dictionary(path.as_ref(), self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        persist::load_dictionary(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_update_in_place() {
        let mut dict = Dictionary::new();
        dict.add_term("contract", 3, 0);
        dict.update_offset_and_size("contract", 128, 40).unwrap();
        assert_eq!(dict.offset_and_size("contract"), Some((128, 40)));
        assert_eq!(dict.doc_frequency("contract"), Some(3));
        assert!(dict.update_offset_and_size("tort", 0, 0).is_err());
    }

    #[test]
    fn missing_terms_and_defaults() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.doc_frequency("absent"), None);
        assert_eq!(dict.idf("absent"), 0.0);
        assert!(dict.record_document(4, 1.5, 0.9));
        assert!(!dict.record_document(4, 2.0, 1.0));
        assert_eq!(dict.document_count(), 1);
        assert_eq!(dict.normalized_length(4), Some(1.5));
        assert_eq!(dict.importance_weight(4), 0.9);
        assert_eq!(dict.importance_weight(5), 1.0);
    }

    #[test]
    fn idf_uses_collection_size() {
        let mut dict = Dictionary::new();
        for d in 0..100 {
            dict.record_document(d, 1.0, 1.0);
        }
        dict.add_term("rare", 1, 0);
        dict.add_term(ALL_DOCS, 100, 0);
        assert!((dict.idf("rare") - 2.0).abs() < 1e-12);
        assert_eq!(dict.idf(ALL_DOCS), 0.0);
        assert_eq!(dict.vocabulary().count(), 1);
    }
}
