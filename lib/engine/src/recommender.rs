//! Recommender service state
//!
//! A [`Recommender`] owns the embedder and the current [`Snapshot`]: a catalog
//! paired with the index built from it. Queries clone the `Arc` of the current
//! snapshot and run without holding any lock, so a reload never blocks or
//! disturbs a query in flight. A reload builds the new index off to the side
//! and only swaps it in once the build has succeeded.

use crate::config::EngineConfig;
use crate::index::Index;
use crate::query::{self, SearchResult};
use crate::recommendation::Recommendation;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shortlist_catalog::{Catalog, LoadReport};
use shortlist_core::{Embedder, HashEmbedder};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A catalog and its index, frozen together.
#[derive(Debug)]
pub struct Snapshot {
    catalog: Arc<Catalog>,
    index: Index,
    generation: u64,
}

impl Snapshot {
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Starts at 1 and increases with every successful reload
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn search(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        query::search(&self.index, embedder, query, k)
    }

    pub fn recommend(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<Recommendation>> {
        let hits = self.search(embedder, query, k)?;
        Ok(hits
            .iter()
            .filter_map(|hit| {
                self.catalog
                    .record_at(hit.position)
                    .map(|record| Recommendation::from_parts(record, hit))
            })
            .collect())
    }
}

pub struct Recommender {
    embedder: Arc<dyn Embedder>,
    config: EngineConfig,
    current: RwLock<Arc<Snapshot>>,
    /// Serialises reloads so generations are assigned in swap order
    reload_lock: Mutex<()>,
}

impl Recommender {
    /// Build the initial snapshot with a caller-supplied embedder.
    ///
    /// `config.embedder` is ignored here; only the strategy and default count
    /// apply.
    pub fn new(embedder: Arc<dyn Embedder>, config: EngineConfig, catalog: Catalog) -> Result<Self> {
        config.validate_search()?;
        let index = Index::build(&catalog, embedder.as_ref(), &config.strategy)?;
        let snapshot = Snapshot {
            catalog: Arc::new(catalog),
            index,
            generation: 1,
        };
        Ok(Self {
            embedder,
            config,
            current: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
        })
    }

    /// Build the initial snapshot with the bundled [`HashEmbedder`].
    pub fn from_config(config: EngineConfig, catalog: Catalog) -> Result<Self> {
        let embedder = HashEmbedder::new(config.embedder.clone())?;
        Self::new(Arc::new(embedder), config, catalog)
    }

    /// The snapshot current at the time of the call
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.snapshot().search(self.embedder.as_ref(), query, k)
    }

    pub fn recommend(&self, query: &str, k: usize) -> Result<Vec<Recommendation>> {
        self.snapshot().recommend(self.embedder.as_ref(), query, k)
    }

    /// Replace the catalog and index as one unit.
    ///
    /// On failure the previous snapshot stays current.
    pub fn reload(&self, catalog: Catalog) -> Result<Arc<Snapshot>> {
        let _guard = self.reload_lock.lock();

        let index = match Index::build(&catalog, self.embedder.as_ref(), &self.config.strategy) {
            Ok(index) => index,
            Err(e) => {
                warn!("Reload failed, keeping generation {}: {}", self.current.read().generation, e);
                return Err(e);
            }
        };

        let generation = self.current.read().generation + 1;
        let snapshot = Arc::new(Snapshot {
            catalog: Arc::new(catalog),
            index,
            generation,
        });
        *self.current.write() = Arc::clone(&snapshot);

        info!("Swapped in catalog generation {} ({} records)", generation, snapshot.len());
        Ok(snapshot)
    }

    pub fn reload_from_path<P: AsRef<Path>>(&self, path: P) -> Result<(Arc<Snapshot>, LoadReport)> {
        let (catalog, report) = Catalog::load(path)?;
        Ok((self.reload(catalog)?, report))
    }

    pub fn reload_from_json(&self, json: &str) -> Result<(Arc<Snapshot>, LoadReport)> {
        let (catalog, report) = Catalog::from_json_str(json)?;
        Ok((self.reload(catalog)?, report))
    }

    pub fn reload_from_values(&self, items: Vec<Value>) -> Result<(Arc<Snapshot>, LoadReport)> {
        let (catalog, report) = Catalog::from_values(items);
        Ok((self.reload(catalog)?, report))
    }
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("model_id", &self.embedder.model_id())
            .field("config", &self.config)
            .field("generation", &self.current.read().generation)
            .finish()
    }
}
