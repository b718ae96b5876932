//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of archive bytes relayed per read.
pub const DEFAULT_CHUNK_SIZE: usize = 102_400;

/// Route clients are redirected to when an archive does not exist.
pub const DEFAULT_NOT_FOUND_ROUTE: &str = "/404.html/";

/// Root configuration for the archive server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Archive streaming settings.
    pub archive: ArchiveConfig,

    /// Static page locations.
    pub pages: PagesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Archive streaming configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory holding one sub-directory per archive identifier.
    pub base_dir: PathBuf,

    /// Pause between relayed chunks, in seconds. Zero disables pacing.
    pub response_delay_secs: f64,

    /// Maximum bytes read from the archiver per chunk.
    pub chunk_size: usize,

    /// Redirect target for unknown or rejected identifiers.
    pub not_found_route: String,

    /// How long shutdown waits for in-flight streams to reap their archivers.
    pub shutdown_grace_secs: u64,

    /// External archiver invocation.
    pub archiver: ArchiverConfig,
}

impl ArchiveConfig {
    /// Pacing delay as a `Duration`.
    ///
    /// Negative or non-finite values collapse to zero; validation rejects
    /// them before the server starts.
    pub fn response_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.response_delay_secs).unwrap_or(Duration::ZERO)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("test_photos"),
            response_delay_secs: 0.0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            not_found_route: DEFAULT_NOT_FOUND_ROUTE.to_string(),
            shutdown_grace_secs: 5,
            archiver: ArchiverConfig::default(),
        }
    }
}

/// External archiver command.
///
/// The archive identifier is appended as the final argument and the process
/// runs with the base directory as its working directory, so entries inside
/// the archive are rooted at the identifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Program to execute (looked up in `PATH`).
    pub program: String,

    /// Arguments placed before the identifier.
    pub args: Vec<String>,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            program: "zip".to_string(),
            // recursive, quiet, write archive to stdout
            args: vec!["-r".to_string(), "-q".to_string(), "-".to_string()],
        }
    }
}

/// Static page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Page served on `/`.
    pub index_path: PathBuf,

    /// Page served on the not-found route.
    pub not_found_path: PathBuf,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("index.html"),
            not_found_path: PathBuf::from("404.html"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// When false, only warnings and errors are logged.
    pub logging_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            log_level: "debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
