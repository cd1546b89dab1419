//! Per-table run leases.
//!
//! A table's provisioned capacity is process-wide mutable state, so two
//! concurrent runs against one table would race the raise/restore pair.
//! A run holds the table's lease from before the raise until after the
//! restore; the guard releases it on drop.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Registry of in-flight runs keyed by table name.
#[derive(Clone, Default)]
pub struct TableLeases {
    inner: Arc<DashMap<String, Uuid>>,
}

impl TableLeases {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for a table; `None` while another run holds it.
    pub fn acquire(&self, table: &str, run_id: Uuid) -> Option<TableLease> {
        use dashmap::mapref::entry::Entry;
        match self.inner.entry(table.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(run_id);
                Some(TableLease {
                    table: table.to_string(),
                    registry: Arc::clone(&self.inner),
                })
            }
        }
    }

    /// Run currently holding a table's lease, if any.
    pub fn holder(&self, table: &str) -> Option<Uuid> {
        self.inner.get(table).map(|entry| *entry.value())
    }
}

/// Guard for one table's lease; releases on drop.
pub struct TableLease {
    table: String,
    registry: Arc<DashMap<String, Uuid>>,
}

impl Drop for TableLease {
    fn drop(&mut self) {
        self.registry.remove(&self.table);
    }
}
