//! Kinesis-backed record stream.

use crate::error::{StoreError, StoreResult};
use crate::stream::{RecordStream, StreamRecord};
use crate::BoxFuture;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::PutRecordsRequestEntry;
use aws_sdk_kinesis::Client;
use tracing::info;

/// Record stream backed by Kinesis.
pub struct KinesisRecordStream {
    client: Client,
}

impl KinesisRecordStream {
    /// Create a stream client from a loaded SDK configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

impl RecordStream for KinesisRecordStream {
    fn put_records(
        &self,
        stream: &str,
        records: Vec<StreamRecord>,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let stream = stream.to_string();
        Box::pin(async move {
            if records.is_empty() {
                return Ok(());
            }
            let mut entries = Vec::with_capacity(records.len());
            for record in records {
                let entry = PutRecordsRequestEntry::builder()
                    .data(Blob::new(record.payload))
                    .partition_key(record.partition_key)
                    .build()
                    .map_err(|err| StoreError::Rejected(err.to_string()))?;
                entries.push(entry);
            }
            info!(stream = %stream, count = entries.len(), "Publishing records to stream");
            self.client
                .put_records()
                .stream_name(&stream)
                .set_records(Some(entries))
                .send()
                .await
                .map_err(|err| StoreError::Transport(err.into_service_error().to_string()))?;
            Ok(())
        })
    }
}
