use shortlist_catalog::CatalogError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] shortlist_core::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Embedding one record failed; the whole build is abandoned.
    #[error("Index build failed at record '{id}': {source}")]
    Build {
        id: String,
        #[source]
        source: shortlist_core::Error,
    },
}

impl EngineError {
    /// True for failures caused by the request itself (bad `k`, wrong
    /// embedding space) rather than by the engine's setup.
    pub fn is_query_error(&self) -> bool {
        match self {
            EngineError::Core(e) => e.is_query_error(),
            _ => false,
        }
    }
}
