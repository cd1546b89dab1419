//! Daily batch source.

use crate::error::{IngestError, IngestResult};
use shorted_core::{CombinedResult, DateStamp, ShortPositionRecord};
use shorted_store::DynObjectStore;
use tracing::info;

/// Fetches the day's combined short-position file from the object store.
///
/// One attempt, no retry: a missing or unreadable object fails the whole
/// run before any capacity change. A parsed file with an empty `Result`
/// list is a valid empty batch.
pub struct BatchSource {
    objects: DynObjectStore,
}

impl BatchSource {
    /// Create a source over an object store.
    pub fn new(objects: DynObjectStore) -> Self {
        Self { objects }
    }

    /// Fetch and parse the batch for the given day.
    pub async fn fetch_daily(
        &self,
        bucket: &str,
        prefix: &str,
        date: DateStamp,
    ) -> IngestResult<Vec<ShortPositionRecord>> {
        let key = date.object_key(prefix);
        let bytes = self
            .objects
            .get(bucket, &key)
            .await
            .map_err(|source| IngestError::Fetch {
                key: key.clone(),
                source,
            })?;
        let combined = CombinedResult::parse(&bytes).map_err(|source| {
            IngestError::MalformedBatch {
                key: key.clone(),
                source,
            }
        })?;
        info!(bucket, key = %key, records = combined.result.len(), "Fetched daily batch");
        Ok(combined.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorted_store::mock::MockObjectStore;
    use std::sync::Arc;

    const SAMPLE: &[u8] = br#"{
        "Result": [
            {"Name": "A Ltd", "Code": "AAA", "Shorts": 5, "Total": 100, "Percent": 5.0, "Industry": "Energy"},
            {"Name": "B Ltd", "Code": "BBB", "Shorts": 9, "Total": 300, "Percent": 3.0, "Industry": "Banks"}
        ]
    }"#;

    fn day() -> DateStamp {
        DateStamp::parse("20240115").unwrap()
    }

    #[tokio::test]
    async fn fetches_and_parses_the_daily_object() {
        let objects = Arc::new(MockObjectStore::new());
        objects.insert_object("bucket", "daily/20240115.json", SAMPLE.to_vec());
        let source = BatchSource::new(objects);

        let records = source.fetch_daily("bucket", "daily", day()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "AAA");
        assert_eq!(records[1].code, "BBB");
    }

    #[tokio::test]
    async fn missing_object_is_a_fetch_error() {
        let source = BatchSource::new(Arc::new(MockObjectStore::new()));
        let err = source.fetch_daily("bucket", "daily", day()).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Fetch { ref key, .. } if key == "daily/20240115.json"
        ));
    }

    #[tokio::test]
    async fn malformed_payload_is_distinct_from_missing() {
        let objects = Arc::new(MockObjectStore::new());
        objects.insert_object("bucket", "daily/20240115.json", b"not json".to_vec());
        let source = BatchSource::new(objects);
        let err = source.fetch_daily("bucket", "daily", day()).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedBatch { .. }));
    }

    #[tokio::test]
    async fn empty_result_list_is_an_empty_batch_not_an_error() {
        let objects = Arc::new(MockObjectStore::new());
        objects.insert_object("bucket", "daily/20240115.json", br#"{"Result": []}"#.to_vec());
        let source = BatchSource::new(objects);
        let records = source.fetch_daily("bucket", "daily", day()).await.unwrap();
        assert!(records.is_empty());
    }
}
