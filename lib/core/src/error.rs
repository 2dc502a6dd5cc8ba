use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The embedder or its model configuration is unusable. Fatal at startup.
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedder mismatch: index was built with '{expected}', query uses '{actual}'")]
    EmbedderMismatch { expected: String, actual: String },

    #[error("Invalid top_k: {0} (must be >= 1)")]
    InvalidTopK(i64),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Query-time failures are the caller's fault and map to a rejected request.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidTopK(_) | Error::InvalidDimension { .. } | Error::EmbedderMismatch { .. }
        )
    }
}
