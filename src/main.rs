//! Archive Streamer
//!
//! Serves `GET /archive/{hash}/` by running an external archiver over
//! `<base_dir>/<hash>` and relaying its output to the client as it is
//! produced.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                   ARCHIVE STREAMER                   │
//!                     │                                                      │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌───────────────┐   │
//!   ──────────────────┼─▶│  http   │───▶│ resolver │───▶│    process    │   │
//!                     │  │ server  │    │          │    │  (archiver)   │   │
//!                     │  └─────────┘    └──────────┘    └───────┬───────┘   │
//!                     │                                         │ stdout    │
//!                     │                                         ▼           │
//!   Client Response   │  ┌─────────┐    ┌──────────────────────────────┐    │
//!   ◀─────────────────┼──│response │◀───│  relay (chunked, paced)      │    │
//!                     │  │  body   │    └──────────────────────────────┘    │
//!                     │  └─────────┘                                        │
//!                     │                                                      │
//!                     │  config · lifecycle · observability                  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use archive_streamer::config::{apply_env, read_config, validate_config, ConfigError, ServerConfig};
use archive_streamer::http::HttpServer;
use archive_streamer::lifecycle::{signals, Shutdown};
use archive_streamer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "archive-streamer")]
#[command(about = "Stream directory archives over HTTP", long_about = None)]
struct Cli {
    /// Directory holding one sub-directory per archive.
    #[arg(short, long)]
    photos: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080.
    #[arg(short, long)]
    bind: Option<String>,
}

fn load(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;

    if let Some(photos) = &cli.photos {
        config.archive.base_dir = photos.clone();
    }
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("archive-streamer v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_dir = %config.archive.base_dir.display(),
        response_delay_secs = config.archive.response_delay_secs,
        archiver = %config.archive.archiver.program,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
