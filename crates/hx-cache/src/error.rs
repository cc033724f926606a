//! Cache error types.

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to serialize/deserialize a cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A manifest path could not be resolved against the worker scope.
    #[error("invalid resource path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A resource could not be fetched while populating a generation.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A resource answered with a non-success status.
    #[error("bad status {status} for {url}")]
    BadStatus { url: String, status: u16 },
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
