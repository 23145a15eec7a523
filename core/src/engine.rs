//! Query-time facade: classifies a query line and runs it through the
//! boolean evaluator and the ranking models.

use std::path::Path;

use tracing::{debug, info};

use crate::boolean::{compile, positive_operands, BooleanEvaluator};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::expansion::{IdentityExpander, QueryExpander};
use crate::index::{DocId, ScoredPosting};
use crate::query::{is_boolean, lex, mentions_operator, to_postfix, QueryToken};
use crate::ranking::pnorm::{self, ResolvedOperand};
use crate::ranking::tfidf::{self, QueryVector};
use crate::ranking::{fusion, rocchio};
use crate::reader::IndexReader;
use crate::tokenizer::tokenize;

pub struct SearchEngine<E = IdentityExpander> {
    index: IndexReader,
    config: SearchConfig,
    expander: E,
}

impl SearchEngine<IdentityExpander> {
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(dictionary_path: P, postings_path: Q, config: SearchConfig) -> Result<Self> {
        Self::new(IndexReader::open(dictionary_path, postings_path)?, config)
    }

    pub fn new(index: IndexReader, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { index, config, expander: IdentityExpander })
    }
}

impl<E: QueryExpander> SearchEngine<E> {
    pub fn with_expander<F: QueryExpander>(self, expander: F) -> SearchEngine<F> {
        SearchEngine { index: self.index, config: self.config, expander }
    }

    pub fn index(&self) -> &IndexReader {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one query line. Lines with an operator or parenthesis are boolean
    /// queries; everything else is ranked free text. A blank line matches
    /// nothing.
    pub fn search(&self, query: &str) -> Result<Vec<ScoredPosting>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let results = match lex(query) {
            Ok(tokens) if is_boolean(&tokens) => self.search_boolean(tokens)?,
            Ok(_) => self.search_free_text(query)?,
            Err(e) if mentions_operator(query) => return Err(e.into()),
            // a stray quote without operators is still free text
            Err(_) => self.search_free_text(query)?,
        };
        info!(query, hits = results.len(), "search");
        Ok(results)
    }

    /// Exact boolean matches, ordered by the fused boolean, p-norm and
    /// tf-idf scores. The result is never cut to `top_k`.
    pub fn search_boolean(&self, tokens: Vec<QueryToken>) -> Result<Vec<ScoredPosting>> {
        let steps = compile(to_postfix(tokens)?, tokenize);
        let positive = positive_operands(&steps);
        let evaluator = BooleanEvaluator::new(&self.index, self.config.min_skip_stride);
        let matches = evaluator.evaluate(steps)?;
        if matches.is_empty() {
            return Ok(matches);
        }

        let terms: Vec<String> = positive.iter().flat_map(|op| op.terms().iter().cloned()).collect();
        let mut resolved: Vec<ResolvedOperand> = Vec::with_capacity(positive.len());
        for operand in positive {
            if let Some(key) = operand.key() {
                resolved.push((key, evaluator.resolve(operand)?));
            }
        }

        let ranking = &self.config.ranking;
        let p_norm = pnorm::score(&self.index, &resolved, ranking);
        let tf_idf = tfidf::rank(&self.index, &self.query_vector(&terms), None)?;
        debug!(matches = matches.len(), p_norm = p_norm.len(), tf_idf = tf_idf.len(), "fusing");
        Ok(fusion::fuse(&matches, &p_norm, &tf_idf, &ranking.fusion))
    }

    /// Top-K tf-idf ranking, followed by one pseudo-relevance feedback
    /// round when `rocchio.feedback_docs` is non-zero.
    pub fn search_free_text(&self, query: &str) -> Result<Vec<ScoredPosting>> {
        let ranking = &self.config.ranking;
        let vector = self.query_vector(&tokenize(query));
        let results = tfidf::rank(&self.index, &vector, Some(ranking.top_k))?;
        let feedback_docs = ranking.rocchio.feedback_docs;
        if feedback_docs == 0 || results.is_empty() {
            return Ok(results);
        }
        let relevant: Vec<DocId> = results.iter().take(feedback_docs).map(|p| p.doc_id).collect();
        self.rerank(&vector, &relevant, &[])
    }

    /// Free-text query revised once with explicit relevance judgments.
    pub fn search_with_feedback(&self, query: &str, relevant: &[DocId], non_relevant: &[DocId]) -> Result<Vec<ScoredPosting>> {
        let vector = self.query_vector(&tokenize(query));
        self.rerank(&vector, relevant, non_relevant)
    }

    fn rerank(&self, vector: &QueryVector, relevant: &[DocId], non_relevant: &[DocId]) -> Result<Vec<ScoredPosting>> {
        let ranking = &self.config.ranking;
        let revised = rocchio::feedback(&self.index, vector, relevant, non_relevant, &ranking.rocchio)?;
        tfidf::rank(&self.index, &revised, Some(ranking.top_k))
    }

    fn query_vector(&self, terms: &[String]) -> QueryVector {
        tfidf::query_vector(&self.expander.expand(terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::WeightedTerm;
    use crate::indexer::Indexer;
    use tempfile::TempDir;

    fn engine(docs: &[(DocId, &str)], config: SearchConfig) -> (TempDir, SearchEngine) {
        let dir = tempfile::tempdir().unwrap();
        let dict_path = dir.path().join("dictionary.bin");
        let postings_path = dir.path().join("postings.bin");
        let mut indexer = Indexer::default();
        for (id, text) in docs {
            indexer.add_document(*id, tokenize(text), 1.0);
        }
        indexer.build(&dict_path, &postings_path).unwrap();
        let engine = SearchEngine::open(&dict_path, &postings_path, config).unwrap();
        (dir, engine)
    }

    fn ids(results: &[ScoredPosting]) -> Vec<DocId> {
        results.iter().map(|p| p.doc_id).collect()
    }

    const DOCS: &[(DocId, &str)] = &[
        (1, "the appeal was dismissed with costs"),
        (2, "negligence claim for damages after the accident"),
        (3, "appeal allowed, negligence established, damages awarded"),
        (4, "the weather was fine"),
    ];

    #[test]
    fn blank_query_is_empty() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        assert!(engine.search("   ").unwrap().is_empty());
    }

    #[test]
    fn boolean_results_stay_within_matches() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        let mut hits = ids(&engine.search("appeal OR negligence").unwrap());
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2, 3]);
        assert_eq!(ids(&engine.search("appeal AND NOT negligence").unwrap()), vec![1]);
    }

    #[test]
    fn free_text_ranks_the_best_match_first() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        let hits = ids(&engine.search("negligence damages appeal").unwrap());
        assert_eq!(hits[0], 3);
        assert!(!hits.contains(&4));
    }

    #[test]
    fn top_k_cuts_free_text_only() {
        let mut config = SearchConfig::default();
        config.ranking.top_k = 1;
        let (_dir, engine) = engine(DOCS, config);
        assert_eq!(engine.search("appeal negligence").unwrap().len(), 1);
        assert_eq!(engine.search("appeal OR negligence").unwrap().len(), 3);
    }

    #[test]
    fn malformed_query_is_an_error() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        let err = engine.search("(appeal AND").unwrap_err();
        assert!(err.is_query_error());
        assert!(engine.search("negligence \"damages AND").unwrap_err().is_query_error());
    }

    #[test]
    fn stray_quotes_and_parens_stay_free_text() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        let plain = ids(&engine.search("negligence damages").unwrap());
        assert_eq!(plain.len(), 2);
        assert_eq!(ids(&engine.search("negligence \"damages").unwrap()), plain);
        assert_eq!(ids(&engine.search("damages (negligence").unwrap()), plain);
    }

    #[test]
    fn pseudo_feedback_keeps_the_original_hits() {
        let mut config = SearchConfig::default();
        config.ranking.rocchio.feedback_docs = 1;
        let (_dir, engine) = engine(DOCS, config);
        let hits = ids(&engine.search("accident").unwrap());
        assert_eq!(hits[0], 2);
    }

    struct Synonyms;

    impl QueryExpander for Synonyms {
        fn expand(&self, terms: &[String]) -> Vec<WeightedTerm> {
            let mut out: Vec<WeightedTerm> = terms.iter().map(|t| WeightedTerm::new(t.clone(), 1.0)).collect();
            if terms.iter().any(|t| t == "harm") {
                out.push(WeightedTerm::new("damag", 0.5));
            }
            out
        }
    }

    #[test]
    fn custom_expander_adds_terms() {
        let (_dir, engine) = engine(DOCS, SearchConfig::default());
        assert!(engine.search("harm").unwrap().is_empty());
        let engine = engine.with_expander(Synonyms);
        let mut hits = ids(&engine.search("harm").unwrap());
        hits.sort_unstable();
        assert_eq!(hits, vec![2, 3]);
    }
}
