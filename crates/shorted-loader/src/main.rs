//! Daily short-position loader entry point.
//!
//! One invocation performs one load: the deployment schedules it once a
//! day after the upstream file is published.

use anyhow::Result;
use clap::Parser;
use shorted_core::DateStamp;
use tracing::info;

/// Daily short-position batch loader
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SHORTED_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Ingest a specific day (YYYYMMDD) instead of today (UTC)
    #[arg(long)]
    date: Option<String>,

    /// Skip the source freshness check
    #[arg(long)]
    skip_refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    shorted_telemetry::init_logging()?;

    info!("Starting shorted loader v{}", env!("CARGO_PKG_VERSION"));

    let config_path = shorted_loader::AppConfig::resolve_path(args.config);
    info!(config_path = %config_path, "Loading configuration");
    let config = shorted_loader::AppConfig::from_file(&config_path)?;

    let date = match args.date {
        Some(ref raw) => DateStamp::parse(raw)?,
        None => DateStamp::today_utc(),
    };

    let app = shorted_loader::Application::new(config).await?;
    app.run(date, args.skip_refresh).await?;

    Ok(())
}
