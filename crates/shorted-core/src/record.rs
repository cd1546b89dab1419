//! Short-position record types and the daily batch envelope.
//!
//! Field names serialize in PascalCase to match both the combined daily
//! JSON file and the attribute names persisted to the table.

use crate::date::DateStamp;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One instrument's entry in the daily combined short-position file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShortPositionRecord {
    /// Company name.
    pub name: String,
    /// Instrument code, unique per listing.
    pub code: String,
    /// Reported open short positions.
    pub shorts: i64,
    /// Total shares on issue.
    pub total: i64,
    /// Shorts as a percentage of total.
    pub percent: f64,
    /// Industry classification.
    pub industry: String,
}

impl ShortPositionRecord {
    /// Attach the run's shared ingestion date to this record.
    pub fn with_date(self, date: DateStamp) -> DatedRecord {
        DatedRecord { record: self, date }
    }
}

/// A record stamped with the ingestion date of its batch.
///
/// Every `DatedRecord` produced by one run carries the same date value;
/// the stamp is derived once at orchestration start, never per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedRecord {
    #[serde(flatten)]
    pub record: ShortPositionRecord,
    #[serde(rename = "Date")]
    pub date: DateStamp,
}

/// Envelope of the daily object-store payload:
/// `{ "Result": [ {Name, Code, Shorts, Total, Percent, Industry}, ... ] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombinedResult {
    /// Records for the day; an empty list is a valid (empty) batch.
    pub result: Vec<ShortPositionRecord>,
}

impl CombinedResult {
    /// Parse the raw object body.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
