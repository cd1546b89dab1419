//! Ingestion error types.
//!
//! Only `Fetch` and `MalformedBatch` abort a run; they fire before any
//! capacity change. Capacity set failures and per-record write failures
//! never surface here — they are logged and counted instead.

use shorted_core::CoreError;
use shorted_store::StoreError;
use thiserror::Error;

/// Ingestion error types.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to fetch daily batch {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Malformed batch payload {key}: {source}")]
    MalformedBatch {
        key: String,
        #[source]
        source: CoreError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ingestion already running for table {0}")]
    RunInProgress(String),

    #[error("Source check failed: {0}")]
    Source(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for ingestion operations.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
