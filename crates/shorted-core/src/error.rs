//! Error types for shorted-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid date stamp: {0}")]
    InvalidDate(String),

    #[error("Malformed batch payload: {0}")]
    MalformedBatch(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
