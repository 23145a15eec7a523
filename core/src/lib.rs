pub mod boolean;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod index;
pub mod indexer;
pub mod persist;
pub mod phrase;
pub mod query;
pub mod ranking;
pub mod reader;
pub mod tokenizer;

pub use config::{IndexerConfig, RankingConfig, SearchConfig};
pub use dictionary::Dictionary;
pub use engine::SearchEngine;
pub use error::{ParseError, Result, SearchError};
pub use expansion::{IdentityExpander, QueryExpander, WeightedTerm};
pub use index::{DocId, Position, Posting, PostingList, ScoredPosting, ALL_DOCS};
pub use indexer::Indexer;
pub use reader::IndexReader;
