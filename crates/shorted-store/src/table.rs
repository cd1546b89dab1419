//! Key-value table seam.

use crate::error::StoreResult;
use crate::BoxFuture;
use shorted_core::DatedRecord;
use std::sync::Arc;

/// Write-unit pair returned by a capacity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputChange {
    /// Write units before the call.
    pub previous: i64,
    /// Write units after the call.
    pub current: i64,
}

impl ThroughputChange {
    /// True when the table was already at the target value.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// Writes against a throughput-limited key-value table.
///
/// Records cross this seam as typed `DatedRecord`s; the backing
/// implementation owns the single conversion to its native attribute
/// representation.
pub trait TableStore: Send + Sync {
    /// Set the table's provisioned write capacity.
    ///
    /// Implementations must treat setting the current value as a no-op
    /// against the control plane and report `previous == current`.
    fn set_write_capacity(
        &self,
        table: &str,
        write_units: i64,
    ) -> BoxFuture<'_, StoreResult<ThroughputChange>>;

    /// Persist one dated record.
    fn put_record(&self, table: &str, record: &DatedRecord) -> BoxFuture<'_, StoreResult<()>>;

    /// Read a freshness marker's RFC 3339 timestamp.
    fn get_last_modified(&self, table: &str, key: &str) -> BoxFuture<'_, StoreResult<String>>;

    /// Advance a freshness marker.
    fn put_last_modified(
        &self,
        table: &str,
        key: &str,
        timestamp: &str,
    ) -> BoxFuture<'_, StoreResult<()>>;
}

/// Arc wrapper for TableStore trait objects.
pub type DynTableStore = Arc<dyn TableStore>;
