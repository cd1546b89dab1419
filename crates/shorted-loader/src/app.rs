//! Application wiring.
//!
//! Builds the AWS-backed stores, optionally refreshes the source object,
//! and runs one ingestion.

use crate::config::AppConfig;
use crate::error::AppResult;
use shorted_core::DateStamp;
use shorted_ingest::{Ingestor, RunReport, SourceMonitor};
use shorted_store::aws::{self, DynamoTableStore, KinesisRecordStream, S3ObjectStore};
use shorted_store::{DynObjectStore, DynTableStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    objects: DynObjectStore,
    tables: DynTableStore,
    ingestor: Ingestor,
}

impl Application {
    /// Wire AWS clients and the ingestor from configuration.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let sdk_config = aws::load_default_config().await;
        let objects: DynObjectStore = Arc::new(S3ObjectStore::new(&sdk_config));
        let tables: DynTableStore = Arc::new(DynamoTableStore::new(&sdk_config));

        let mut ingestor = Ingestor::new(
            Arc::clone(&objects),
            Arc::clone(&tables),
            config.ingestion(),
        )?;
        if config.stream.is_some() {
            ingestor = ingestor.with_stream(Arc::new(KinesisRecordStream::new(&sdk_config)));
        }

        Ok(Self {
            config,
            objects,
            tables,
            ingestor,
        })
    }

    /// Refresh the source object when configured, then run one ingestion.
    pub async fn run(&self, date: DateStamp, skip_refresh: bool) -> AppResult<RunReport> {
        if !skip_refresh {
            self.refresh_source(date).await;
        }
        let report = self.ingestor.run_for_date(date).await?;
        info!(
            run_id = %report.run_id,
            date = %report.date,
            fetched = report.fetched,
            dispatched = report.drain.dispatched,
            failed = report.drain.failed,
            "Load complete"
        );
        Ok(report)
    }

    /// Best-effort freshness refresh; ingestion proceeds on whatever
    /// object is present either way.
    async fn refresh_source(&self, date: DateStamp) {
        let (Some(url), Some(marker_key)) = (
            self.config.source.url.as_deref(),
            self.config.source.marker_key.as_deref(),
        ) else {
            return;
        };
        let monitor = match SourceMonitor::new(
            Arc::clone(&self.objects),
            Arc::clone(&self.tables),
            self.config.source.marker_table.clone(),
        ) {
            Ok(monitor) => monitor,
            Err(err) => {
                warn!(%err, "Skipping source refresh");
                return;
            }
        };
        let key = date.object_key(&self.config.source.key_prefix);
        match monitor
            .refresh_if_modified(url, marker_key, &self.config.source.bucket, &key)
            .await
        {
            Ok(true) => info!(url, key = %key, "Source refreshed"),
            Ok(false) => info!(url, "Source unchanged"),
            Err(err) => warn!(url, %err, "Source refresh failed, ingesting existing object"),
        }
    }
}
