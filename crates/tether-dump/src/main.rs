//! # tether-dump
//!
//! Reads a tether byte stream and prints every decoded frame.
//!
//! ## Usage
//!
//! ```bash
//! # De-frame standard input
//! tether-dump < capture.bin
//!
//! # Read from a TCP peer, printing payloads as hex
//! tether-dump --source tcp:127.0.0.1:4000 --hex
//!
//! # Run with a config file
//! tether-dump --config /path/to/tether.toml
//! ```

mod config;
mod dump;
mod metrics;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, SourceConfig};
use crate::dump::DumpOptions;

#[derive(Parser)]
#[command(name = "tether-dump", about = "Print the frames carried by a tether byte stream")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Byte source: stdin, file:<path> or tcp:<host:port>
    #[arg(short, long)]
    source: Option<SourceConfig>,

    /// Print payload bytes as hex
    #[arg(long)]
    hex: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only frames
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        config.source = source;
    }
    config.validate()?;

    metrics::init_metrics();
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            tracing::error!("Failed to start metrics server: {}", e);
        }
    }

    let mut stdout = std::io::stdout();
    dump::run(&config, &mut stdout, DumpOptions { hex: cli.hex }).await?;

    Ok(())
}
