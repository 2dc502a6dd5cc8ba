//! # Shortlist Core
//!
//! Building blocks for the Shortlist retrieval engine:
//!
//! - [`Vector`] - dense embedding with cosine similarity
//! - [`Embedder`] - text-to-vector seam, with the bundled [`HashEmbedder`]
//! - [`HnswGraph`] - approximate nearest-neighbour candidate graph
//!
//! ## Example
//!
//! ```rust
//! use shortlist_core::{Embedder, HashEmbedder, HashEmbedderConfig};
//!
//! let embedder = HashEmbedder::new(HashEmbedderConfig::default()).unwrap();
//! let a = embedder.embed("verbal reasoning test").unwrap();
//! let b = embedder.embed("verbal comprehension").unwrap();
//! assert_eq!(a.dim(), embedder.dimension());
//! assert!(a.cosine_similarity(&b) > 0.0);
//! ```

pub mod embedder;
pub mod error;
pub mod hnsw;
pub mod vector;

/// SIMD-optimized vector operations
///
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use embedder::{Embedder, HashEmbedder, HashEmbedderBuilder, HashEmbedderConfig, DEFAULT_DIM};
pub use error::{Error, Result};
pub use hnsw::{HnswGraph, HnswParams};
pub use vector::{Vector, MIN_SIMILARITY};
