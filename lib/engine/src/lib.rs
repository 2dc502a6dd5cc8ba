//! # Shortlist Engine
//!
//! Turns a [`Catalog`](shortlist_catalog::Catalog) into a searchable index and
//! answers free-text queries with ranked recommendations.
//!
//! - [`Index`] - one embedding per record, in catalog order
//! - [`query`] - exact top-k selection, optionally seeded by HNSW candidates
//! - [`Recommender`] - the embedder plus the current [`Snapshot`], with atomic reload
//!
//! ```rust
//! use shortlist_catalog::{Catalog, CatalogRecord};
//! use shortlist_engine::{EngineConfig, Recommender};
//!
//! let (catalog, _) = Catalog::from_records(vec![
//!     CatalogRecord::new("a", "Verbal Reasoning", "Reading comprehension passages"),
//!     CatalogRecord::new("b", "Mechanical Comprehension", "Gears, levers and pulleys"),
//! ]);
//! let recommender = Recommender::from_config(EngineConfig::default(), catalog).unwrap();
//!
//! let recs = recommender.recommend("reading comprehension", 1).unwrap();
//! assert_eq!(recs[0].id, "a");
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod recommendation;
pub mod recommender;

pub use config::{EngineConfig, SearchStrategy, DEFAULT_EF_SEARCH, DEFAULT_TOP_K};
pub use error::{EngineError, Result};
pub use index::{Index, IndexEntry};
pub use query::{search, search_vector, validate_top_k, SearchResult};
pub use recommendation::Recommendation;
pub use recommender::{Recommender, Snapshot};
