//! AWS-backed store implementations.
//!
//! One thin client per seam: S3 for objects, DynamoDB for the table,
//! Kinesis for the stream. All three share one loaded `SdkConfig`.

mod object;
mod stream;
mod table;

pub use object::S3ObjectStore;
pub use stream::KinesisRecordStream;
pub use table::DynamoTableStore;

use aws_config::BehaviorVersion;

/// Load the shared AWS configuration from the default provider chain.
pub async fn load_default_config() -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest()).load().await
}
