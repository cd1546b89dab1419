//! Integer date stamps in `YYYYMMDD` form.
//!
//! The store keys every record by an integer date so that range queries
//! over the `Date` sort attribute stay numeric. One stamp is derived per
//! ingestion run and shared by every record in that run's batch.

use crate::error::{CoreError, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar day as a `YYYYMMDD` integer (e.g. `20240115`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DateStamp(u32);

impl DateStamp {
    /// Build a stamp from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() as u32 * 10_000 + date.month() * 100 + date.day())
    }

    /// Stamp for the current UTC calendar day.
    pub fn today_utc() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Parse an 8-digit `YYYYMMDD` string, rejecting impossible dates.
    pub fn parse(input: &str) -> Result<Self> {
        let value: u32 = input
            .parse()
            .map_err(|_| CoreError::InvalidDate(input.to_string()))?;
        let (year, month, day) = (value / 10_000, value / 100 % 100, value % 100);
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| CoreError::InvalidDate(input.to_string()))?;
        Ok(Self(value))
    }

    /// Raw integer value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Object-store key of this day's batch under the given prefix.
    pub fn object_key(self, prefix: &str) -> String {
        format!("{}/{}.json", prefix.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_date_composes_digits() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(DateStamp::from_date(date).as_u32(), 20240105);
    }

    #[test]
    fn object_key_uses_prefix_and_day() {
        let stamp = DateStamp::parse("20240115").unwrap();
        assert_eq!(
            stamp.object_key("testShortedData"),
            "testShortedData/20240115.json"
        );
        // trailing slash on the prefix does not double up
        assert_eq!(
            stamp.object_key("testShortedData/"),
            "testShortedData/20240115.json"
        );
    }

    #[test]
    fn parse_rejects_garbage_and_impossible_dates() {
        assert!(DateStamp::parse("yesterday").is_err());
        assert!(DateStamp::parse("20241332").is_err());
        assert!(DateStamp::parse("20240230").is_err());
        assert!(DateStamp::parse("20240229").is_ok());
    }

    #[test]
    fn stamps_order_chronologically() {
        let earlier = DateStamp::parse("20231231").unwrap();
        let later = DateStamp::parse("20240101").unwrap();
        assert!(earlier < later);
    }
}
