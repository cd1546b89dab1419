//! Source freshness checks.
//!
//! The upstream publisher re-issues the combined file at most once a day.
//! Before ingesting, the loader can compare the source URL's
//! `Last-Modified` header against a marker stored in the table and
//! re-upload the object-store copy only when the source has moved.

use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, Utc};
use shorted_store::{DynObjectStore, DynTableStore};
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for source HTTP calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Refreshes the object-store copy of a source URL when the source is
/// newer than the stored last-modified marker.
pub struct SourceMonitor {
    http: reqwest::Client,
    objects: DynObjectStore,
    tables: DynTableStore,
    marker_table: String,
}

impl SourceMonitor {
    /// Create a monitor storing markers in the given table.
    pub fn new(
        objects: DynObjectStore,
        tables: DynTableStore,
        marker_table: impl Into<String>,
    ) -> IngestResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| IngestError::Source(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            objects,
            tables,
            marker_table: marker_table.into(),
        })
    }

    /// Refresh `bucket/key` from `url` when the source is newer than the
    /// marker stored under `marker_key`. Returns whether a refresh
    /// happened. A missing marker counts as stale.
    pub async fn refresh_if_modified(
        &self,
        url: &str,
        marker_key: &str,
        bucket: &str,
        key: &str,
    ) -> IngestResult<bool> {
        let head = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        let last_modified = head
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| IngestError::Source(format!("{url} sent no Last-Modified header")))?;
        let source_time = DateTime::parse_from_rfc2822(last_modified)
            .map_err(|err| {
                IngestError::Source(format!("bad Last-Modified {last_modified}: {err}"))
            })?
            .with_timezone(&Utc);

        let marker = match self
            .tables
            .get_last_modified(&self.marker_table, marker_key)
            .await
        {
            Ok(timestamp) => Some(timestamp),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err.into()),
        };
        if let Some(marker) = marker {
            let marker_time = DateTime::parse_from_rfc3339(&marker)
                .map_err(|err| IngestError::Source(format!("bad stored marker {marker}: {err}")))?
                .with_timezone(&Utc);
            if !is_newer(source_time, marker_time) {
                debug!(url, marker = %marker_time, "Source unchanged since last refresh");
                return Ok(false);
            }
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        self.objects.put(bucket, key, body.to_vec()).await?;
        self.tables
            .put_last_modified(&self.marker_table, marker_key, &source_time.to_rfc3339())
            .await?;
        info!(url, bucket, key, size = body.len(), "Refreshed source object");
        Ok(true)
    }
}

/// Strictly-newer comparison at second precision.
fn is_newer(source: DateTime<Utc>, marker: DateTime<Utc>) -> bool {
    source.timestamp() > marker.timestamp()
}
