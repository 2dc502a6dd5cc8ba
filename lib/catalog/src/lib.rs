//! # Shortlist Catalog
//!
//! The assessment catalog: typed [`CatalogRecord`]s and the validating loader
//! that is the only way raw JSON becomes records.
//!
//! ```rust
//! use shortlist_catalog::Catalog;
//!
//! let (catalog, report) = Catalog::from_json_str(r#"[
//!     {"id": "shl-001", "name": "Verify Numerical Reasoning", "description": "Charts and tables."},
//!     {"id": "shl-002", "description": "No name, rejected"}
//! ]"#).unwrap();
//!
//! assert_eq!(catalog.len(), 1);
//! assert_eq!(report.rejected_ids(), vec!["shl-002"]);
//! ```

pub mod catalog;
pub mod error;
pub mod record;

pub use catalog::{Catalog, LoadReport, Rejection};
pub use error::{CatalogError, Result};
pub use record::{CatalogRecord, RejectReason};
