//! Prometheus metrics for the ingestion pipeline.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally: a registration
//! failure means duplicate metric names, a startup defect that should
//! crash immediately. These panics only occur during static
//! initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, IntCounterVec, IntGaugeVec,
};

/// Records successfully written, by table.
pub static RECORDS_WRITTEN_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "shorted_records_written_total",
        "Records successfully written to the table",
        &["table"]
    )
    .unwrap()
});

/// Record writes that failed, by table.
pub static WRITE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "shorted_write_failures_total",
        "Record writes rejected or errored, by table",
        &["table"]
    )
    .unwrap()
});

/// Dispatch cycles run by the throttled writer, by table.
pub static DRAIN_CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "shorted_drain_cycles_total",
        "Dispatch cycles run by the throttled writer",
        &["table"]
    )
    .unwrap()
});

/// Last provisioned write capacity observed per table.
pub static WRITE_CAPACITY_UNITS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "shorted_write_capacity_units",
        "Provisioned write capacity last set on the table",
        &["table"]
    )
    .unwrap()
});
