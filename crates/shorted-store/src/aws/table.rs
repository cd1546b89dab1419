//! DynamoDB-backed table store.

use crate::error::{StoreError, StoreResult};
use crate::table::{TableStore, ThroughputChange};
use crate::BoxFuture;
use aws_sdk_dynamodb::types::{AttributeValue, ProvisionedThroughput};
use aws_sdk_dynamodb::Client;
use shorted_core::DatedRecord;
use std::collections::HashMap;
use tracing::{debug, info};

/// Attribute naming the identity of a freshness marker row.
const MARKER_KEY_ATTRIBUTE: &str = "name_id";
/// Attribute holding a marker's RFC 3339 timestamp.
const MARKER_DATE_ATTRIBUTE: &str = "date";

/// Table store backed by DynamoDB.
pub struct DynamoTableStore {
    client: Client,
}

impl DynamoTableStore {
    /// Create a store from a loaded SDK configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    async fn current_throughput(&self, table: &str) -> StoreResult<(i64, i64)> {
        let described = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.into_service_error().to_string()))?;
        let throughput = described
            .table()
            .and_then(|t| t.provisioned_throughput())
            .ok_or_else(|| StoreError::MissingThroughput(table.to_string()))?;
        let read = throughput
            .read_capacity_units()
            .ok_or_else(|| StoreError::MissingThroughput(table.to_string()))?;
        let write = throughput
            .write_capacity_units()
            .ok_or_else(|| StoreError::MissingThroughput(table.to_string()))?;
        Ok((read, write))
    }
}

/// Convert one dated record into the table's native attribute map.
///
/// The only place record fields meet attribute names; everything upstream
/// stays typed.
fn record_item(record: &DatedRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::with_capacity(7);
    item.insert(
        "Name".to_string(),
        AttributeValue::S(record.record.name.clone()),
    );
    item.insert(
        "Code".to_string(),
        AttributeValue::S(record.record.code.clone()),
    );
    item.insert(
        "Shorts".to_string(),
        AttributeValue::N(record.record.shorts.to_string()),
    );
    item.insert(
        "Total".to_string(),
        AttributeValue::N(record.record.total.to_string()),
    );
    item.insert(
        "Percent".to_string(),
        AttributeValue::N(record.record.percent.to_string()),
    );
    item.insert(
        "Industry".to_string(),
        AttributeValue::S(record.record.industry.clone()),
    );
    item.insert(
        "Date".to_string(),
        AttributeValue::N(record.date.as_u32().to_string()),
    );
    item
}

impl TableStore for DynamoTableStore {
    fn set_write_capacity(
        &self,
        table: &str,
        write_units: i64,
    ) -> BoxFuture<'_, StoreResult<ThroughputChange>> {
        let table = table.to_string();
        Box::pin(async move {
            // Read units are preserved; the control plane rejects updates
            // that match the current value, so those are skipped here.
            let (read_units, previous) = self.current_throughput(&table).await?;
            if previous == write_units {
                debug!(table = %table, write_units, "Write capacity already at target");
                return Ok(ThroughputChange {
                    previous,
                    current: write_units,
                });
            }
            let throughput = ProvisionedThroughput::builder()
                .read_capacity_units(read_units)
                .write_capacity_units(write_units)
                .build()
                .map_err(|err| StoreError::Rejected(err.to_string()))?;
            self.client
                .update_table()
                .table_name(&table)
                .provisioned_throughput(throughput)
                .send()
                .await
                .map_err(|err| StoreError::Transport(err.into_service_error().to_string()))?;
            info!(table = %table, previous, current = write_units, "Updated provisioned write capacity");
            Ok(ThroughputChange {
                previous,
                current: write_units,
            })
        })
    }

    fn put_record(&self, table: &str, record: &DatedRecord) -> BoxFuture<'_, StoreResult<()>> {
        let table = table.to_string();
        let item = record_item(record);
        Box::pin(async move {
            self.client
                .put_item()
                .table_name(&table)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|err| {
                    let service_err = err.into_service_error();
                    if service_err.is_provisioned_throughput_exceeded_exception() {
                        StoreError::ThroughputExceeded {
                            table: table.clone(),
                        }
                    } else {
                        StoreError::Rejected(service_err.to_string())
                    }
                })?;
            Ok(())
        })
    }

    fn get_last_modified(&self, table: &str, key: &str) -> BoxFuture<'_, StoreResult<String>> {
        let table = table.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let output = self
                .client
                .get_item()
                .table_name(&table)
                .key(MARKER_KEY_ATTRIBUTE, AttributeValue::S(key.clone()))
                .send()
                .await
                .map_err(|err| StoreError::Transport(err.into_service_error().to_string()))?;
            let value = output
                .item()
                .and_then(|item| item.get(MARKER_DATE_ATTRIBUTE))
                .and_then(|attr| attr.as_s().ok())
                .ok_or_else(|| StoreError::MarkerMissing {
                    table: table.clone(),
                    key: key.clone(),
                })?;
            Ok(value.clone())
        })
    }

    fn put_last_modified(
        &self,
        table: &str,
        key: &str,
        timestamp: &str,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let table = table.to_string();
        let key = key.to_string();
        let timestamp = timestamp.to_string();
        Box::pin(async move {
            self.client
                .put_item()
                .table_name(&table)
                .item(MARKER_KEY_ATTRIBUTE, AttributeValue::S(key))
                .item(MARKER_DATE_ATTRIBUTE, AttributeValue::S(timestamp))
                .send()
                .await
                .map_err(|err| StoreError::Rejected(err.into_service_error().to_string()))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorted_core::{DateStamp, ShortPositionRecord};

    fn sample() -> DatedRecord {
        ShortPositionRecord {
            name: "Example Corp".to_string(),
            code: "EXC".to_string(),
            shorts: 120_000,
            total: 9_000_000,
            percent: 1.33,
            industry: "Materials".to_string(),
        }
        .with_date(DateStamp::parse("20240115").unwrap())
    }

    #[test]
    fn record_item_has_one_attribute_per_field() {
        let item = record_item(&sample());
        assert_eq!(item.len(), 7);
        assert_eq!(item["Name"], AttributeValue::S("Example Corp".into()));
        assert_eq!(item["Code"], AttributeValue::S("EXC".into()));
        assert_eq!(item["Shorts"], AttributeValue::N("120000".into()));
        assert_eq!(item["Total"], AttributeValue::N("9000000".into()));
        assert_eq!(item["Percent"], AttributeValue::N("1.33".into()));
        assert_eq!(item["Industry"], AttributeValue::S("Materials".into()));
        assert_eq!(item["Date"], AttributeValue::N("20240115".into()));
    }
}
