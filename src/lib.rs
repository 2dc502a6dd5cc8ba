//! # Shortlist
//!
//! An offline recommender for assessment catalogs. Catalog entries and
//! free-text queries (a job title, a skill list, a whole job description) are
//! embedded into fixed-size vectors by a local model, and the entries closest to
//! the query by cosine similarity come back ranked.
//!
//! No network service is called at any point.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! shortlist serve --catalog data/catalog.json --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use shortlist::prelude::*;
//!
//! let (catalog, report) = Catalog::from_json_str(r#"[
//!     {"id": "shl-002", "name": "Verify Verbal Reasoning",
//!      "description": "Reading comprehension and critical evaluation of passages.",
//!      "tags": ["verbal", "reasoning", "comprehension"]},
//!     {"id": "shl-005", "name": "Verify Mechanical Comprehension",
//!      "description": "Gears, levers, pulleys and basic physics.",
//!      "tags": ["mechanical", "physics"]}
//! ]"#).unwrap();
//! assert!(report.is_clean());
//!
//! let recommender = Recommender::from_config(EngineConfig::default(), catalog).unwrap();
//! let recs = recommender.recommend("assess verbal comprehension skills", 2).unwrap();
//! assert_eq!(recs[0].id, "shl-002");
//! ```
//!
//! ## Crate Structure
//!
//! - `shortlist-core` - vectors, SIMD kernels, the `Embedder` trait, HNSW
//! - `shortlist-catalog` - catalog records and the validating loader
//! - `shortlist-engine` - index builder, query engine, snapshot reload
//! - `shortlist-api` - REST API

pub mod evaluate;

// Re-export core types
pub use shortlist_core::{
    Embedder, Error, HashEmbedder, HashEmbedderConfig, HnswParams, Result, Vector, DEFAULT_DIM, MIN_SIMILARITY,
};

// Re-export catalog
pub use shortlist_catalog::{Catalog, CatalogError, CatalogRecord, LoadReport, RejectReason, Rejection};

// Re-export engine
pub use shortlist_engine::{
    EngineConfig, EngineError, Index, Recommendation, Recommender, SearchResult, SearchStrategy, Snapshot,
};

// Re-export API
pub use shortlist_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, CatalogRecord, Embedder, EngineConfig, EngineError, HashEmbedder, HashEmbedderConfig, LoadReport,
        Recommendation, Recommender, RestApi, SearchResult, SearchStrategy, Vector,
    };
}

/// SIMD-optimized vector operations
pub mod simd {
    pub use shortlist_core::simd::{dot_product_simd, norm_simd};
}
