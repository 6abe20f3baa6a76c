//! # Runline
//!
//! Streams an endless track of pooled segments ahead of a running agent.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use runline_engine::{app, EngineConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let mut config = EngineConfig::load();
    config.validate();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(config.log_filter.parse()?))
        .init();

    info!("Runline starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config path: {}", EngineConfig::config_path().display());

    match app::run(config).await? {
        Some(summary) => info!("Covered {:.1} units in {} ticks", summary.distance, summary.stats.ticks),
        None => info!("Cancelled before the run started"),
    }

    info!("Runline shutdown complete");
    Ok(())
}
