//! Ingestion orchestration.
//!
//! One run walks `Fetching → CapacityRaised → Draining → CapacityRestored`;
//! a fetch failure aborts before the first capacity change, and the
//! restore step runs unconditionally once the raise has happened. There is
//! no rollback if the process dies mid-drain — capacity can stay raised,
//! which the next run's idempotent raise absorbs.

use crate::capacity::CapacityManager;
use crate::error::{IngestError, IngestResult};
use crate::lease::TableLeases;
use crate::source::BatchSource;
use crate::throttle::{DrainReport, ThrottleConfig, ThrottledWriter};
use shorted_core::{DateStamp, DatedRecord};
use shorted_store::{DynObjectStore, DynRecordStream, DynTableStore, StreamRecord};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Caller-supplied settings for one ingestion target.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Bucket holding the daily combined files.
    pub bucket: String,
    /// Key prefix of the daily files (`<prefix>/<YYYYMMDD>.json`).
    pub key_prefix: String,
    /// Table receiving the records.
    pub table: String,
    /// Write units provisioned for the load window.
    pub bulk_write_units: i64,
    /// Write units restored after the load.
    pub steady_write_units: i64,
    /// Stream to fan the dated batch out to, if any.
    pub stream: Option<String>,
    /// Pacing settings for the drain.
    pub throttle: ThrottleConfig,
}

impl IngestionConfig {
    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> IngestResult<()> {
        if self.bucket.is_empty() || self.key_prefix.is_empty() || self.table.is_empty() {
            return Err(IngestError::InvalidConfig(
                "bucket, key prefix and table are required".to_string(),
            ));
        }
        if self.bulk_write_units <= 0 || self.steady_write_units <= 0 {
            return Err(IngestError::InvalidConfig(
                "write units must be positive".to_string(),
            ));
        }
        if self.throttle.window.is_zero() {
            return Err(IngestError::InvalidConfig(
                "pacing window must be non-zero".to_string(),
            ));
        }
        if self.steady_write_units >= self.bulk_write_units {
            // policy, not structure: legal, but almost certainly a mistake
            warn!(
                bulk = self.bulk_write_units,
                steady = self.steady_write_units,
                "Steady write units not below bulk"
            );
        }
        Ok(())
    }
}

/// Phase of a run, carried on its log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Fetching,
    CapacityRaised,
    Draining,
    CapacityRestored,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier stamped on every log line of the run.
    pub run_id: Uuid,
    /// Date applied to every record of the batch.
    pub date: DateStamp,
    /// Records the daily file contained.
    pub fetched: usize,
    /// Drain counters.
    pub drain: DrainReport,
    /// Whether the bulk capacity raise succeeded.
    pub capacity_raised: bool,
    /// Whether the steady capacity restore succeeded.
    pub capacity_restored: bool,
}

/// Orchestrates one daily load.
pub struct Ingestor {
    source: BatchSource,
    capacity: CapacityManager,
    writer: ThrottledWriter,
    stream: Option<DynRecordStream>,
    leases: TableLeases,
    config: IngestionConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Build an ingestor over the given stores. Rejects configurations
    /// that could not drive a run.
    pub fn new(
        objects: DynObjectStore,
        table_store: DynTableStore,
        config: IngestionConfig,
    ) -> IngestResult<Self> {
        config.validate()?;
        let source = BatchSource::new(objects);
        let capacity = CapacityManager::new(Arc::clone(&table_store));
        let writer = ThrottledWriter::new(
            table_store,
            config.table.clone(),
            config.throttle.clone(),
        );
        Ok(Self {
            source,
            capacity,
            writer,
            stream: None,
            leases: TableLeases::new(),
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Attach a stream for post-drain fan-out.
    #[must_use]
    pub fn with_stream(mut self, stream: DynRecordStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Token observed between drain cycles; triggering it stops further
    /// scheduling while the capacity restore still runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one ingestion for the current UTC day.
    pub async fn run(&self) -> IngestResult<RunReport> {
        self.run_for_date(DateStamp::today_utc()).await
    }

    /// Run one ingestion for a specific day.
    ///
    /// The same stamp names the object key and is applied to every record
    /// of the batch.
    pub async fn run_for_date(&self, date: DateStamp) -> IngestResult<RunReport> {
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            %date,
            table = %self.config.table,
            phase = ?RunPhase::Fetching,
            "Starting ingestion run"
        );

        // Fetch before touching capacity: a missing day's file must leave
        // the table's provisioning exactly as it was.
        let records = match self
            .source
            .fetch_daily(&self.config.bucket, &self.config.key_prefix, date)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(%run_id, %err, "Aborting run before any capacity change");
                return Err(err);
            }
        };
        let fetched = records.len();

        let _lease = self
            .leases
            .acquire(&self.config.table, run_id)
            .ok_or_else(|| IngestError::RunInProgress(self.config.table.clone()))?;

        let mut capacity_raised = true;
        let pace = match self
            .capacity
            .set_write_capacity(&self.config.table, self.config.bulk_write_units)
            .await
        {
            Ok(change) => change.current,
            Err(err) => {
                capacity_raised = false;
                warn!(
                    %run_id,
                    %err,
                    units = self.config.bulk_write_units,
                    "Capacity raise failed, writes may be throttled"
                );
                self.config.bulk_write_units
            }
        };
        info!(%run_id, pace, phase = ?RunPhase::CapacityRaised, "Write capacity window open");

        // One stamp for the whole batch, derived above — never per record.
        let dated: Vec<DatedRecord> = records
            .into_iter()
            .map(|record| record.with_date(date))
            .collect();
        let stream_entries = if self.stream.is_some() && self.config.stream.is_some() {
            build_stream_entries(&dated)
        } else {
            Vec::new()
        };

        info!(%run_id, records = dated.len(), phase = ?RunPhase::Draining, "Draining batch");
        let drain_result = self.writer.drain(dated, pace, &self.cancel).await;

        // Restore unconditionally, even when the drain was rejected as
        // misconfigured or reported per-record failures.
        let capacity_restored = match self
            .capacity
            .set_write_capacity(&self.config.table, self.config.steady_write_units)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    %run_id,
                    %err,
                    units = self.config.steady_write_units,
                    "Capacity restore failed, table may stay over-provisioned"
                );
                false
            }
        };
        info!(%run_id, phase = ?RunPhase::CapacityRestored, "Write capacity window closed");

        let drain = drain_result?;

        if let (Some(stream), Some(stream_name)) =
            (&self.stream, self.config.stream.as_deref())
        {
            if !stream_entries.is_empty() {
                if let Err(err) = stream.put_records(stream_name, stream_entries).await {
                    warn!(%run_id, stream = stream_name, %err, "Stream publish failed");
                }
            }
        }

        info!(
            %run_id,
            attempted = drain.attempted,
            dispatched = drain.dispatched,
            failed = drain.failed,
            "Ingestion run complete"
        );
        Ok(RunReport {
            run_id,
            date,
            fetched,
            drain,
            capacity_raised,
            capacity_restored,
        })
    }
}

/// Serialize the dated batch for stream fan-out, partitioned by
/// instrument code.
fn build_stream_entries(records: &[DatedRecord]) -> Vec<StreamRecord> {
    records
        .iter()
        .filter_map(|record| match serde_json::to_vec(record) {
            Ok(payload) => Some(StreamRecord {
                payload,
                partition_key: record.record.code.clone(),
            }),
            Err(err) => {
                warn!(code = %record.record.code, %err, "Skipping unserializable record");
                None
            }
        })
        .collect()
}
