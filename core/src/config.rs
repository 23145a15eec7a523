use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SearchError};

/// Smallest `floor(sqrt(len))` stride that still produces skip pointers.
/// Lists shorter than 4 entries get no skips.
pub const DEFAULT_MIN_SKIP_STRIDE: usize = 2;

/// Index build configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub min_skip_stride: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { min_skip_stride: DEFAULT_MIN_SKIP_STRIDE }
    }
}

/// Weights applied to each softmax-normalized model score during fusion.
/// Empirically tuned values, not structurally required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub boolean: f64,
    pub p_norm: f64,
    pub tf_idf: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { boolean: 0.5, p_norm: 0.85, tf_idf: 0.7 }
    }
}

/// Rocchio relevance feedback parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocchioConfig {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// How many of the highest-idf relevant-document terms join the query.
    pub expansion_terms: usize,
    /// Top-ranked documents treated as relevant for pseudo feedback; 0 disables it.
    pub feedback_docs: usize,
}

impl Default for RocchioConfig {
    fn default() -> Self {
        Self { alpha: 0.8, beta: 0.3, gamma: 0.1, expansion_terms: 10, feedback_docs: 0 }
    }
}

/// Ranking configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Result cutoff for free-text queries. Fused boolean results are never cut.
    pub top_k: usize,
    /// Exponent of the extended boolean model.
    pub p: f64,
    /// Weight p-norm query terms by idf instead of uniformly.
    pub idf_query_weights: bool,
    /// idf used by the p-norm model for terms with no document frequency.
    pub idf_floor: f64,
    pub fusion: FusionWeights,
    pub rocchio: RocchioConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            p: 1.0,
            idf_query_weights: true,
            idf_floor: 0.001,
            fusion: FusionWeights::default(),
            rocchio: RocchioConfig::default(),
        }
    }
}

/// Query-time configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum ad-hoc stride for skipping over intermediate result lists.
    pub min_skip_stride: usize,
    pub ranking: RankingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { min_skip_stride: DEFAULT_MIN_SKIP_STRIDE, ranking: RankingConfig::default() }
    }
}

impl SearchConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: SearchConfig = serde_json::from_str(&text)
            .map_err(|e| SearchError::Config(format!("{}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ranking.p.is_finite() && self.ranking.p > 0.0) {
            return Err(SearchError::Config(format!("p-norm exponent must be positive, got {}", self.ranking.p)));
        }
        if self.ranking.top_k == 0 {
            return Err(SearchError::Config("top_k must be at least 1".into()));
        }
        if self.ranking.idf_floor <= 0.0 {
            return Err(SearchError::Config("idf_floor must be positive".into()));
        }
        Ok(())
    }
}
