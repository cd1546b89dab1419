//! Store error taxonomy.
//!
//! `NotFound` is deliberately distinct from `Transport`: a missing daily
//! object aborts an ingestion run the same way, but callers log the two
//! differently and an empty batch is neither.

use thiserror::Error;

/// Errors surfaced by the store seams.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Write throughput exceeded on table {table}")]
    ThroughputExceeded { table: String },

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("No marker {key} in table {table}")]
    MarkerMissing { table: String, key: String },

    #[error("Table {0} has no provisioned throughput description")]
    MissingThroughput(String),
}

impl StoreError {
    /// True when the failure is a missing object rather than a broken call.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::MarkerMissing { .. }
        )
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
