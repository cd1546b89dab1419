//! Loader configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use shorted_ingest::{IngestionConfig, ThrottleConfig};
use std::path::Path;
use std::time::Duration;

/// Source object settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Bucket holding the daily combined files.
    pub bucket: String,
    /// Key prefix of the daily files (`<prefix>/<YYYYMMDD>.json`).
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Upstream URL to freshness-check before ingesting.
    #[serde(default)]
    pub url: Option<String>,
    /// Marker key identifying the source in the marker table.
    #[serde(default)]
    pub marker_key: Option<String>,
    /// Table storing freshness markers.
    #[serde(default = "default_marker_table")]
    pub marker_table: String,
}

/// Target table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table receiving the records.
    pub name: String,
    /// Write units provisioned during the load window.
    #[serde(default = "default_bulk_write_units")]
    pub bulk_write_units: i64,
    /// Write units restored after the load.
    #[serde(default = "default_steady_write_units")]
    pub steady_write_units: i64,
}

/// Drain pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Window between dispatch cycles (ms). Default: 1,000 (1 second).
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Upper bound on writes in flight at once. Default: 64.
    #[serde(default = "default_max_outstanding")]
    pub max_outstanding: usize,
}

fn default_key_prefix() -> String {
    "testShortedData".to_string()
}

fn default_marker_table() -> String {
    "lastUpdate".to_string()
}

fn default_bulk_write_units() -> i64 {
    25
}

fn default_steady_write_units() -> i64 {
    5
}

fn default_window_ms() -> u64 {
    1_000
}

fn default_max_outstanding() -> usize {
    64
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_outstanding: default_max_outstanding(),
        }
    }
}

/// Top-level loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub table: TableConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Stream receiving the dated batch after the drain.
    #[serde(default)]
    pub stream: Option<String>,
}

impl AppConfig {
    /// Resolve the config path: CLI arg > `SHORTED_CONFIG` env var > default.
    pub fn resolve_path(cli: Option<String>) -> String {
        cli.or_else(|| std::env::var("SHORTED_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string())
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|err| AppError::Config(err.to_string()))
    }

    /// Ingestion settings derived from this configuration.
    pub fn ingestion(&self) -> IngestionConfig {
        IngestionConfig {
            bucket: self.source.bucket.clone(),
            key_prefix: self.source.key_prefix.clone(),
            table: self.table.name.clone(),
            bulk_write_units: self.table.bulk_write_units,
            steady_write_units: self.table.steady_write_units,
            stream: self.stream.clone(),
            throttle: ThrottleConfig {
                window: Duration::from_millis(self.pacing.window_ms),
                max_outstanding: self.pacing.max_outstanding,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [source]
        bucket = "shortedappjmk"

        [table]
        name = "testShorts"
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: AppConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.source.bucket, "shortedappjmk");
        assert_eq!(config.source.key_prefix, "testShortedData");
        assert_eq!(config.source.marker_table, "lastUpdate");
        assert_eq!(config.table.bulk_write_units, 25);
        assert_eq!(config.table.steady_write_units, 5);
        assert_eq!(config.pacing.window_ms, 1_000);
        assert_eq!(config.pacing.max_outstanding, 64);
        assert!(config.stream.is_none());
    }

    #[test]
    fn ingestion_settings_carry_the_window() {
        let mut config: AppConfig = toml::from_str(MINIMAL).unwrap();
        config.pacing.window_ms = 250;
        config.stream = Some("shortedDataStream".to_string());
        let ingestion = config.ingestion();
        assert_eq!(ingestion.table, "testShorts");
        assert_eq!(ingestion.throttle.window, Duration::from_millis(250));
        assert_eq!(ingestion.stream.as_deref(), Some("shortedDataStream"));
        assert!(ingestion.validate().is_ok());
    }

    #[test]
    fn from_file_reads_and_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.table.name, "testShorts");
    }

    #[test]
    fn missing_required_fields_are_config_errors() {
        let err = toml::from_str::<AppConfig>("[source]\nbucket = \"b\"").unwrap_err();
        assert!(err.to_string().contains("table"));
    }
}
