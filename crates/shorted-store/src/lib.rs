//! External collaborator seams for the shorted pipeline.
//!
//! The pipeline talks to three backing services: an object store holding
//! the daily combined file, a throughput-limited key-value table, and a
//! record stream for fan-out. Each is modeled as an object-safe trait so
//! the core can be driven against recording mocks in tests and against the
//! AWS SDK in production.

pub mod aws;
pub mod error;
pub mod mock;
pub mod object;
pub mod stream;
pub mod table;

use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub use error::{StoreError, StoreResult};
pub use object::{DynObjectStore, ObjectStore};
pub use stream::{DynRecordStream, RecordStream, StreamRecord};
pub use table::{DynTableStore, TableStore, ThroughputChange};
