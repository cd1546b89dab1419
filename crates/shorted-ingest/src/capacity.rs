//! Provisioned write capacity control.

use shorted_store::{DynTableStore, StoreResult, ThroughputChange};
use shorted_telemetry::metrics::WRITE_CAPACITY_UNITS;
use tracing::{debug, info};

/// Raises and restores a table's provisioned write capacity around a load
/// window.
///
/// Stateless beyond the store handle; raise and restore are the same
/// idempotent set call with different targets, invoked once each per run
/// regardless of how the writes in between fared.
pub struct CapacityManager {
    table_store: DynTableStore,
}

impl CapacityManager {
    /// Create a manager over a table store.
    pub fn new(table_store: DynTableStore) -> Self {
        Self { table_store }
    }

    /// Set the table's write capacity, returning previous and new units.
    pub async fn set_write_capacity(
        &self,
        table: &str,
        units: i64,
    ) -> StoreResult<ThroughputChange> {
        let change = self.table_store.set_write_capacity(table, units).await?;
        WRITE_CAPACITY_UNITS
            .with_label_values(&[table])
            .set(change.current);
        if change.is_noop() {
            debug!(table, units = change.current, "Write capacity unchanged");
        } else {
            info!(
                table,
                previous = change.previous,
                current = change.current,
                "Write capacity set"
            );
        }
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorted_store::mock::MockTableStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_previous_and_new_units() {
        let store = Arc::new(MockTableStore::new());
        store.set_write_units("shorts", 5);
        let manager = CapacityManager::new(store.clone());

        let change = manager.set_write_capacity("shorts", 25).await.unwrap();
        assert_eq!((change.previous, change.current), (5, 25));

        let change = manager.set_write_capacity("shorts", 25).await.unwrap();
        assert!(change.is_noop());
    }
}
