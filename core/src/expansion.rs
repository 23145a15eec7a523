use serde::{Deserialize, Serialize};

/// A query term with the weight it contributes to the query vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: f64,
}

impl WeightedTerm {
    pub fn new(term: impl Into<String>, weight: f64) -> Self {
        Self { term: term.into(), weight }
    }
}

/// Turns the normalized terms of a query into weighted query terms.
///
/// Spelling correction or thesaurus lookups plug in here; their output is
/// scored like any other query term.
pub trait QueryExpander {
    fn expand(&self, terms: &[String]) -> Vec<WeightedTerm>;
}

/// Each original term with weight 1.0, nothing added.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExpander;

impl QueryExpander for IdentityExpander {
    fn expand(&self, terms: &[String]) -> Vec<WeightedTerm> {
        terms.iter().map(|t| WeightedTerm::new(t.clone(), 1.0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keeps_duplicates() {
        let terms = vec!["court".to_string(), "court".to_string()];
        let expanded = IdentityExpander.expand(&terms);
        assert_eq!(expanded, vec![WeightedTerm::new("court", 1.0), WeightedTerm::new("court", 1.0)]);
    }
}
