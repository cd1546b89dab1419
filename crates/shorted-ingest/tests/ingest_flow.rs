//! End-to-end orchestration against recording stores.
//!
//! Exercises the full run sequence: fetch first, raise capacity, stamp,
//! drain, restore capacity, optional stream fan-out.

use serde_json::json;
use shorted_core::DateStamp;
use shorted_ingest::{IngestError, IngestionConfig, Ingestor, ThrottleConfig};
use shorted_store::mock::{MockObjectStore, MockRecordStream, MockTableStore};
use std::sync::Arc;
use std::time::Duration;

const BUCKET: &str = "shorted-data";
const TABLE: &str = "shorts";
const DAY_KEY: &str = "daily/20240115.json";

fn day() -> DateStamp {
    DateStamp::parse("20240115").unwrap()
}

fn config() -> IngestionConfig {
    IngestionConfig {
        bucket: BUCKET.to_string(),
        key_prefix: "daily".to_string(),
        table: TABLE.to_string(),
        bulk_write_units: 25,
        steady_write_units: 5,
        stream: None,
        throttle: ThrottleConfig {
            window: Duration::from_millis(10),
            max_outstanding: 8,
        },
    }
}

fn payload(codes: &[&str]) -> Vec<u8> {
    let records: Vec<_> = codes
        .iter()
        .map(|code| {
            json!({
                "Name": format!("{code} Ltd"),
                "Code": code,
                "Shorts": 5_000,
                "Total": 100_000,
                "Percent": 5.0,
                "Industry": "Energy"
            })
        })
        .collect();
    serde_json::to_vec(&json!({ "Result": records })).unwrap()
}

fn seeded_stores(codes: &[&str]) -> (Arc<MockObjectStore>, Arc<MockTableStore>) {
    let objects = Arc::new(MockObjectStore::new());
    objects.insert_object(BUCKET, DAY_KEY, payload(codes));
    let tables = Arc::new(MockTableStore::new());
    tables.set_write_units(TABLE, 5);
    (objects, tables)
}

#[tokio::test(start_paused = true)]
async fn happy_path_raises_stamps_drains_and_restores() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB", "CCC"]);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.drain.attempted, 3);
    assert_eq!(report.drain.dispatched, 3);
    assert_eq!(report.drain.failed, 0);
    assert!(report.capacity_raised);
    assert!(report.capacity_restored);

    // raise to bulk before the writes, restore to steady after
    assert_eq!(
        tables.capacity_calls(),
        vec![(TABLE.to_string(), 25), (TABLE.to_string(), 5)]
    );

    // every record landed in the table with the run's single date stamp
    let puts = tables.recorded_puts();
    assert_eq!(puts.len(), 3);
    assert!(puts.iter().all(|(table, _)| table == TABLE));
    assert!(puts.iter().all(|(_, record)| record.date == day()));
}

#[tokio::test]
async fn fetch_failure_never_touches_capacity_or_writes() {
    let objects = Arc::new(MockObjectStore::new());
    let tables = Arc::new(MockTableStore::new());
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let err = ingestor.run_for_date(day()).await.unwrap_err();

    assert!(matches!(err, IngestError::Fetch { .. }));
    assert!(tables.capacity_calls().is_empty());
    assert_eq!(tables.put_attempts(), 0);
}

#[tokio::test]
async fn malformed_payload_aborts_before_capacity() {
    let objects = Arc::new(MockObjectStore::new());
    objects.insert_object(BUCKET, DAY_KEY, b"<html>maintenance</html>".to_vec());
    let tables = Arc::new(MockTableStore::new());
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let err = ingestor.run_for_date(day()).await.unwrap_err();

    assert!(matches!(err, IngestError::MalformedBatch { .. }));
    assert!(tables.capacity_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn restore_runs_exactly_once_even_when_every_write_fails() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB"]);
    tables.set_fail_puts(true);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert_eq!(report.drain.attempted, 2);
    assert_eq!(report.drain.dispatched, 2);
    assert_eq!(report.drain.failed, 2);
    assert_eq!(
        tables.capacity_calls(),
        vec![(TABLE.to_string(), 25), (TABLE.to_string(), 5)]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_raise_is_non_fatal_and_paces_at_bulk_units() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB"]);
    tables.fail_capacity_sets_to(25);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert!(!report.capacity_raised);
    assert!(report.capacity_restored);
    assert_eq!(report.drain.dispatched, 2);
    assert_eq!(tables.recorded_puts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_restore_is_reported_but_not_fatal() {
    let (objects, tables) = seeded_stores(&["AAA"]);
    tables.fail_capacity_sets_to(5);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert!(report.capacity_raised);
    assert!(!report.capacity_restored);
    assert_eq!(report.drain.failed, 0);
}

#[tokio::test(start_paused = true)]
async fn empty_batch_still_cycles_capacity() {
    let objects = Arc::new(MockObjectStore::new());
    objects.insert_object(BUCKET, DAY_KEY, payload(&[]));
    let tables = Arc::new(MockTableStore::new());
    tables.set_write_units(TABLE, 5);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.drain.attempted, 0);
    assert_eq!(tables.put_attempts(), 0);
    assert_eq!(
        tables.capacity_calls(),
        vec![(TABLE.to_string(), 25), (TABLE.to_string(), 5)]
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_against_the_same_table_is_refused() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB", "CCC"]);
    // writes outlast the second run's attempt to start
    tables.set_put_delay(Duration::from_millis(100));
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();

    let (first, second) = tokio::join!(ingestor.run_for_date(day()), ingestor.run_for_date(day()));

    let report = first.unwrap();
    assert_eq!(report.drain.dispatched, 3);
    assert!(matches!(second, Err(IngestError::RunInProgress(ref table)) if table == TABLE));
    // only the winning run wrote
    assert_eq!(tables.put_attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn dated_batch_fans_out_to_the_stream_after_the_drain() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB"]);
    let stream = Arc::new(MockRecordStream::new());
    let mut cfg = config();
    cfg.stream = Some("shorts-stream".to_string());
    let ingestor = Ingestor::new(objects, tables, cfg)
        .unwrap()
        .with_stream(stream.clone());

    ingestor.run_for_date(day()).await.unwrap();

    let published = stream.recorded_publishes();
    assert_eq!(published.len(), 1);
    let (stream_name, entries) = &published[0];
    assert_eq!(stream_name, "shorts-stream");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].partition_key, "AAA");
    let body: serde_json::Value = serde_json::from_slice(&entries[0].payload).unwrap();
    assert_eq!(body["Code"], "AAA");
    assert_eq!(body["Date"], 20240115);
}

#[tokio::test(start_paused = true)]
async fn stream_publish_failure_does_not_fail_the_run() {
    let (objects, tables) = seeded_stores(&["AAA"]);
    let stream = Arc::new(MockRecordStream::new());
    stream.set_fail(true);
    let mut cfg = config();
    cfg.stream = Some("shorts-stream".to_string());
    let ingestor = Ingestor::new(objects, tables.clone(), cfg)
        .unwrap()
        .with_stream(stream);

    let report = ingestor.run_for_date(day()).await.unwrap();
    assert!(report.drain.is_clean());
    assert_eq!(tables.recorded_puts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_still_restores_capacity() {
    let (objects, tables) = seeded_stores(&["AAA", "BBB", "CCC"]);
    let ingestor = Ingestor::new(objects, tables.clone(), config()).unwrap();
    ingestor.cancellation_token().cancel();

    let report = ingestor.run_for_date(day()).await.unwrap();

    assert_eq!(report.drain.attempted, 3);
    assert_eq!(report.drain.dispatched, 0);
    assert_eq!(tables.put_attempts(), 0);
    // the restore step is not skippable, even for an aborted drain
    assert_eq!(
        tables.capacity_calls(),
        vec![(TABLE.to_string(), 25), (TABLE.to_string(), 5)]
    );
}

#[tokio::test]
async fn non_positive_write_units_are_rejected_at_construction() {
    let objects = Arc::new(MockObjectStore::new());
    let tables = Arc::new(MockTableStore::new());
    let mut cfg = config();
    cfg.bulk_write_units = 0;
    let err = Ingestor::new(objects, tables, cfg).unwrap_err();
    assert!(matches!(err, IngestError::InvalidConfig(_)));
}
