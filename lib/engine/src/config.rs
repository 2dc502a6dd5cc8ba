//! Engine configuration

use crate::Result;
use serde::{Deserialize, Serialize};
use shortlist_core::{Error, HashEmbedderConfig, HnswParams};

/// Default number of recommendations when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 5;

/// Default HNSW search breadth
pub const DEFAULT_EF_SEARCH: usize = 64;

/// How the query engine finds the top `k` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Score every entry. Results are the exact top `k`.
    #[default]
    Exact,
    /// Let an HNSW graph propose `max(ef_search, k)` candidates and rank those
    /// exactly. `ef_search` is the accuracy knob: once it or `k` reaches the
    /// catalog size the engine scans everything and results equal
    /// [`Exact`](Self::Exact). A graph that proposes fewer than `k` candidates
    /// also falls back to the full scan.
    /// Below that, a true top-`k` entry can be missed; ordering and rank
    /// invariants still hold for what is returned.
    Hnsw {
        #[serde(default)]
        params: HnswParams,
        #[serde(default = "default_ef_search")]
        ef_search: usize,
    },
}

fn default_ef_search() -> usize {
    DEFAULT_EF_SEARCH
}

impl SearchStrategy {
    pub fn hnsw(ef_search: usize) -> Self {
        SearchStrategy::Hnsw {
            params: HnswParams::default(),
            ef_search,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let SearchStrategy::Hnsw { params, ef_search } = self {
            params.validate()?;
            if *ef_search == 0 {
                return Err(Error::InvalidConfig("ef_search must be at least 1".to_string()).into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub embedder: HashEmbedderConfig,
    #[serde(default)]
    pub strategy: SearchStrategy,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedder: HashEmbedderConfig::default(),
            strategy: SearchStrategy::default(),
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.embedder.validate()?;
        self.validate_search()
    }

    /// Checks the strategy and default count only, for callers that bring
    /// their own embedder.
    pub fn validate_search(&self) -> Result<()> {
        self.strategy.validate()?;
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfig("default_top_k must be at least 1".to_string()).into());
        }
        Ok(())
    }
}
