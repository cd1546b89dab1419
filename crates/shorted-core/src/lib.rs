//! Core domain types for the shorted ingestion pipeline.
//!
//! This crate provides the fundamental types shared across the workspace:
//! - `ShortPositionRecord` / `DatedRecord`: daily short-position rows
//! - `DateStamp`: integer `YYYYMMDD` ingestion date
//! - `CombinedResult`: envelope of the daily object-store payload

pub mod date;
pub mod error;
pub mod record;

pub use date::DateStamp;
pub use error::{CoreError, Result};
pub use record::{CombinedResult, DatedRecord, ShortPositionRecord};
