use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures that make the whole catalog source unusable.
///
/// Problems with individual records are not errors; they are collected in a
/// [`LoadReport`](crate::LoadReport) and the remaining records still load.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog must be a JSON array of records, found {0}")]
    NotAnArray(&'static str),
}
