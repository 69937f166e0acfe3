//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection, query, schema).
    #[error("store backend error: {0}")]
    Backend(String),

    /// Record (de)serialization failed.
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record for this holder already exists.
    #[error("a license for holder {0} already exists")]
    DuplicateHolder(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
