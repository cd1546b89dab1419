//! Rate-limited concurrent batch writer.
//!
//! Drains a batch of dated records into the table, scheduling at most
//! `write_units_per_window` independent write tasks per pacing window so
//! dispatch stays at or below the table's provisioned write capacity. A
//! separate semaphore bounds how many writes may be outstanding at once:
//! pacing limits what each window *schedules*, the permit pool limits what
//! is *in flight* when write latency spans windows.

use crate::error::{IngestError, IngestResult};
use shorted_core::DatedRecord;
use shorted_store::DynTableStore;
use shorted_telemetry::metrics::{
    DRAIN_CYCLES_TOTAL, RECORDS_WRITTEN_TOTAL, WRITE_FAILURES_TOTAL,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Pacing settings for one drain.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Interval between dispatch cycles.
    pub window: Duration,
    /// Upper bound on writes in flight across windows.
    pub max_outstanding: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            max_outstanding: 64,
        }
    }
}

/// Outcome counters for one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records the batch contained.
    pub attempted: usize,
    /// Write tasks actually scheduled.
    pub dispatched: usize,
    /// Scheduled writes that completed with an error.
    pub failed: usize,
}

impl DrainReport {
    /// True when every record was scheduled and none failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dispatched == self.attempted && self.failed == 0
    }
}

/// Rate-limited concurrent dispatcher draining batches into one table.
pub struct ThrottledWriter {
    table_store: DynTableStore,
    table: String,
    config: ThrottleConfig,
}

impl ThrottledWriter {
    /// Create a writer for one table.
    pub fn new(
        table_store: DynTableStore,
        table: impl Into<String>,
        config: ThrottleConfig,
    ) -> Self {
        Self {
            table_store,
            table: table.into(),
            config,
        }
    }

    /// Drain the batch.
    ///
    /// Records are pulled in arrival order; each cycle schedules up to
    /// `write_units_per_window` of them as independent write tasks and the
    /// next cycle starts one window later without waiting on those tasks.
    /// After the last cycle is scheduled the task set is joined so the
    /// returned report carries real write outcomes. Cancellation is
    /// observed between cycles: remaining records stay unscheduled, tasks
    /// already scheduled are still joined.
    ///
    /// A failed write is logged and counted; it never stops the drain and
    /// never touches sibling writes.
    pub async fn drain(
        &self,
        batch: Vec<DatedRecord>,
        write_units_per_window: i64,
        cancel: &CancellationToken,
    ) -> IngestResult<DrainReport> {
        if write_units_per_window <= 0 {
            return Err(IngestError::InvalidConfig(format!(
                "write units per window must be positive, got {write_units_per_window}"
            )));
        }
        let attempted = batch.len();
        if attempted == 0 {
            debug!(table = %self.table, "Empty batch, nothing to drain");
            return Ok(DrainReport::default());
        }

        let burst = write_units_per_window as usize;
        let permits = Arc::new(Semaphore::new(self.config.max_outstanding));
        let mut pending: VecDeque<DatedRecord> = batch.into();
        let mut tasks: JoinSet<bool> = JoinSet::new();
        let mut ticker = tokio::time::interval(self.config.window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut dispatched = 0usize;
        let mut cycle = 0usize;

        while !pending.is_empty() {
            // First tick fires immediately; later ticks pace the cycles.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        table = %self.table,
                        remaining = pending.len(),
                        dispatched,
                        "Drain cancelled between cycles"
                    );
                    break;
                }
                _ = ticker.tick() => {}
            }
            cycle += 1;
            let take = burst.min(pending.len());
            debug!(
                table = %self.table,
                cycle,
                take,
                remaining = pending.len() - take,
                "Dispatching burst"
            );
            DRAIN_CYCLES_TOTAL
                .with_label_values(&[self.table.as_str()])
                .inc();
            for record in pending.drain(..take) {
                tasks.spawn(write_record(
                    Arc::clone(&self.table_store),
                    self.table.clone(),
                    record,
                    Arc::clone(&permits),
                ));
                dispatched += 1;
            }
        }

        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(err) => {
                    failed += 1;
                    warn!(table = %self.table, %err, "Write task aborted");
                }
            }
        }
        Ok(DrainReport {
            attempted,
            dispatched,
            failed,
        })
    }
}

/// One independent write; holds an outstanding-writes permit for the
/// duration of the store call.
async fn write_record(
    table_store: DynTableStore,
    table: String,
    record: DatedRecord,
    permits: Arc<Semaphore>,
) -> bool {
    // The semaphore is never closed while tasks hold the Arc.
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return false,
    };
    match table_store.put_record(&table, &record).await {
        Ok(()) => {
            RECORDS_WRITTEN_TOTAL
                .with_label_values(&[table.as_str()])
                .inc();
            true
        }
        Err(err) => {
            warn!(table = %table, code = %record.record.code, %err, "Record write failed");
            WRITE_FAILURES_TOTAL
                .with_label_values(&[table.as_str()])
                .inc();
            false
        }
    }
}
