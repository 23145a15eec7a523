use thiserror::Error;

/// Errors raised while turning a query line into postfix form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("query is empty")]
    Empty,

    #[error("unbalanced parenthesis at token {0}")]
    UnbalancedParenthesis(usize),

    #[error("operator {operator} at token {position} is missing an operand")]
    DanglingOperator { operator: &'static str, position: usize },

    #[error("empty parentheses at token {0}")]
    EmptyGroup(usize),

    #[error("unterminated phrase starting at byte {0}")]
    UnterminatedPhrase(usize),
}

/// Main error type for index and query operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Query parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Malformed postfix query: {0}")]
    MalformedQuery(String),

    #[error("Unknown term: {0}")]
    UnknownTerm(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Errors caused by the query text rather than by the index.
    pub fn is_query_error(&self) -> bool {
        matches!(self, SearchError::Parse(_) | SearchError::MalformedQuery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::from(ParseError::UnbalancedParenthesis(3));
        assert_eq!(err.to_string(), "Query parse error: unbalanced parenthesis at token 3");
    }

    #[test]
    fn test_query_errors() {
        assert!(SearchError::from(ParseError::Empty).is_query_error());
        assert!(!SearchError::Corrupt("bad record".into()).is_query_error());
    }
}
