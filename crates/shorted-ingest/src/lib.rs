//! Capacity-aware ingestion of daily short-position batches.
//!
//! The core of the pipeline: fetch the day's combined file, raise the
//! table's provisioned write capacity, drain the batch through a
//! rate-limited concurrent writer, restore capacity, and optionally fan
//! the batch out to a stream.

pub mod capacity;
pub mod error;
pub mod freshness;
pub mod ingestor;
pub mod lease;
pub mod source;
pub mod throttle;

pub use capacity::CapacityManager;
pub use error::{IngestError, IngestResult};
pub use freshness::SourceMonitor;
pub use ingestor::{IngestionConfig, Ingestor, RunReport};
pub use lease::{TableLease, TableLeases};
pub use source::BatchSource;
pub use throttle::{DrainReport, ThrottleConfig, ThrottledWriter};
