//! Index builder
//!
//! Embeds every catalog record with the injected [`Embedder`] and keeps the
//! vectors in catalog order. An index remembers which embedding space it was
//! built in so queries from a different embedder are rejected instead of
//! silently compared.

use crate::config::SearchStrategy;
use crate::{EngineError, Result};
use rayon::prelude::*;
use shortlist_catalog::Catalog;
use shortlist_core::{Embedder, Error, HnswGraph, Vector};
use std::time::Instant;
use tracing::info;

/// One indexed record
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub record_id: String,
    pub embedding: Vector,
}

/// Immutable vector index over one catalog snapshot
#[derive(Debug, Clone)]
pub struct Index {
    entries: Vec<IndexEntry>,
    dimension: usize,
    model_id: String,
    strategy: SearchStrategy,
    graph: Option<HnswGraph>,
}

impl Index {
    /// Embed every record and assemble the index.
    ///
    /// Any failure aborts the build; a partially embedded catalog is never
    /// returned.
    pub fn build(catalog: &Catalog, embedder: &dyn Embedder, strategy: &SearchStrategy) -> Result<Self> {
        strategy.validate()?;
        let started = Instant::now();
        let dimension = embedder.dimension();

        // Embed in parallel, then settle errors in catalog order so a failing
        // build always names the earliest bad record.
        let embedded: Vec<Result<IndexEntry>> = catalog
            .records()
            .par_iter()
            .map(|record| {
                let embedding = embedder
                    .embed(&record.embedding_text())
                    .map_err(|source| EngineError::Build {
                        id: record.id.clone(),
                        source,
                    })?;
                if embedding.dim() != dimension {
                    return Err(EngineError::Build {
                        id: record.id.clone(),
                        source: Error::InvalidDimension {
                            expected: dimension,
                            actual: embedding.dim(),
                        },
                    });
                }
                Ok(IndexEntry {
                    record_id: record.id.clone(),
                    embedding,
                })
            })
            .collect();
        let entries = embedded.into_iter().collect::<Result<Vec<_>>>()?;

        let graph = match strategy {
            SearchStrategy::Exact => None,
            SearchStrategy::Hnsw { params, .. } => Some(HnswGraph::build(
                dimension,
                entries.iter().map(|entry| &entry.embedding),
                *params,
            )?),
        };

        info!(
            "Built index: {} entries, dim {}, model {}, strategy {:?} in {:?}",
            entries.len(),
            dimension,
            embedder.model_id(),
            strategy,
            started.elapsed()
        );

        Ok(Self {
            entries,
            dimension,
            model_id: embedder.model_id().to_string(),
            strategy: *strategy,
            graph,
        })
    }

    /// Fails unless `embedder` produces vectors in this index's space.
    pub fn check_compatible(&self, embedder: &dyn Embedder) -> shortlist_core::Result<()> {
        if embedder.model_id() != self.model_id {
            return Err(Error::EmbedderMismatch {
                expected: self.model_id.clone(),
                actual: embedder.model_id().to_string(),
            });
        }
        if embedder.dimension() != self.dimension {
            return Err(Error::InvalidDimension {
                expected: self.dimension,
                actual: embedder.dimension(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn entry(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn strategy(&self) -> &SearchStrategy {
        &self.strategy
    }

    pub fn graph(&self) -> Option<&HnswGraph> {
        self.graph.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortlist_catalog::CatalogRecord;
    use shortlist_core::{HashEmbedder, HashEmbedderConfig};

    /// Fails on any text containing "poison".
    struct FlakyEmbedder(HashEmbedder);

    impl Embedder for FlakyEmbedder {
        fn embed(&self, text: &str) -> shortlist_core::Result<Vector> {
            if text.contains("poison") {
                return Err(Error::Embedding("model refused input".to_string()));
            }
            self.0.embed(text)
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    /// Claims one dimension, produces another.
    struct LyingEmbedder;

    impl Embedder for LyingEmbedder {
        fn embed(&self, _text: &str) -> shortlist_core::Result<Vector> {
            Ok(Vector::new(vec![1.0; 3]))
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_id(&self) -> &str {
            "lying"
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            CatalogRecord::new("a", "Alpha", "first record"),
            CatalogRecord::new("b", "Beta", "second record"),
            CatalogRecord::new("c", "Gamma", "third record"),
        ])
        .0
    }

    fn embedder() -> HashEmbedder {
        HashEmbedder::new(HashEmbedderConfig::default()).unwrap()
    }

    #[test]
    fn test_build_keeps_catalog_order() {
        let index = Index::build(&catalog(), &embedder(), &SearchStrategy::Exact).unwrap();
        let ids: Vec<&str> = index.entries().iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(index.entries().iter().all(|e| e.embedding.dim() == index.dimension()));
        assert!(index.graph().is_none());
    }

    #[test]
    fn test_build_embeds_the_documented_text() {
        let catalog = catalog();
        let e = embedder();
        let index = Index::build(&catalog, &e, &SearchStrategy::Exact).unwrap();
        let expected = e.embed(&catalog.records()[1].embedding_text()).unwrap();
        assert_eq!(index.entry(1).unwrap().embedding, expected);
    }

    #[test]
    fn test_build_is_idempotent() {
        let a = Index::build(&catalog(), &embedder(), &SearchStrategy::Exact).unwrap();
        let b = Index::build(&catalog(), &embedder(), &SearchStrategy::Exact).unwrap();
        assert_eq!(a.entries(), b.entries());
    }

    #[test]
    fn test_empty_catalog_builds_empty_index() {
        let index = Index::build(&Catalog::empty(), &embedder(), &SearchStrategy::hnsw(8)).unwrap();
        assert!(index.is_empty());
        assert!(index.graph().unwrap().is_empty());
    }

    #[test]
    fn test_embed_failure_aborts_build() {
        let (catalog, _) = Catalog::from_records(vec![
            CatalogRecord::new("ok", "Fine", "fine"),
            CatalogRecord::new("bad", "Poison", "poison pill"),
        ]);
        let err = Index::build(&catalog, &FlakyEmbedder(embedder()), &SearchStrategy::Exact).unwrap_err();
        match err {
            EngineError::Build { id, .. } => assert_eq!(id, "bad"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_reports_earliest_failure() {
        let mut records: Vec<CatalogRecord> = (0..200)
            .map(|i| CatalogRecord::new(format!("r{i}"), "Fine", "fine"))
            .collect();
        records[37] = CatalogRecord::new("first-bad", "Poison", "poison");
        records[150] = CatalogRecord::new("second-bad", "Poison", "poison");
        let (catalog, _) = Catalog::from_records(records);

        for _ in 0..10 {
            let err = Index::build(&catalog, &FlakyEmbedder(embedder()), &SearchStrategy::Exact).unwrap_err();
            match err {
                EngineError::Build { id, .. } => assert_eq!(id, "first-bad"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_wrong_dimension_aborts_build() {
        let err = Index::build(&catalog(), &LyingEmbedder, &SearchStrategy::Exact).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Build {
                source: Error::InvalidDimension { expected: 4, actual: 3 },
                ..
            }
        ));
    }

    #[test]
    fn test_compatibility_check() {
        let index = Index::build(&catalog(), &embedder(), &SearchStrategy::Exact).unwrap();
        assert!(index.check_compatible(&embedder()).is_ok());

        let other = HashEmbedder::builder().dimension(64).build().unwrap();
        assert!(matches!(
            index.check_compatible(&other),
            Err(Error::EmbedderMismatch { .. })
        ));
    }

    #[test]
    fn test_hnsw_strategy_builds_graph() {
        let index = Index::build(&catalog(), &embedder(), &SearchStrategy::hnsw(2)).unwrap();
        assert_eq!(index.graph().unwrap().len(), 3);
    }
}
