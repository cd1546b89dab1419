//! S3-backed object store.

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectStore;
use crate::BoxFuture;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

/// Object store backed by S3.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a store from a loaded SDK configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

impl ObjectStore for S3ObjectStore {
    fn get(&self, bucket: &str, key: &str) -> BoxFuture<'_, StoreResult<Vec<u8>>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let output = self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|err| {
                    let service_err = err.into_service_error();
                    if service_err.is_no_such_key() {
                        StoreError::NotFound {
                            bucket: bucket.clone(),
                            key: key.clone(),
                        }
                    } else {
                        StoreError::Transport(service_err.to_string())
                    }
                })?;
            let body = output
                .body
                .collect()
                .await
                .map_err(|err| StoreError::Transport(err.to_string()))?;
            let bytes = body.into_bytes().to_vec();
            debug!(bucket = %bucket, key = %key, size = bytes.len(), "Downloaded object");
            Ok(bytes)
        })
    }

    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> BoxFuture<'_, StoreResult<()>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let size = body.len();
            self.client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .body(ByteStream::from(body))
                .send()
                .await
                .map_err(|err| StoreError::Transport(err.into_service_error().to_string()))?;
            info!(bucket = %bucket, key = %key, size, "Uploaded object");
            Ok(())
        })
    }
}
