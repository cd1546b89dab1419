//! Record stream seam.

use crate::error::StoreResult;
use crate::BoxFuture;
use std::sync::Arc;

/// One stream entry: an opaque payload routed by partition key.
#[derive(Debug, Clone)]
pub struct StreamRecord {
    /// Serialized record body.
    pub payload: Vec<u8>,
    /// Shard routing key.
    pub partition_key: String,
}

/// Batch publishing onto a partitioned record stream.
pub trait RecordStream: Send + Sync {
    /// Publish a batch of records in one call.
    fn put_records(
        &self,
        stream: &str,
        records: Vec<StreamRecord>,
    ) -> BoxFuture<'_, StoreResult<()>>;
}

/// Arc wrapper for RecordStream trait objects.
pub type DynRecordStream = Arc<dyn RecordStream>;
