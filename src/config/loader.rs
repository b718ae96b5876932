//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Pacing delay between chunks, in seconds.
pub const ENV_RESPONSE_DELAY: &str = "RESPONSE_DELAY";
/// `0` turns debug logging off, any other integer turns it on.
pub const ENV_ENABLE_LOGGING: &str = "ENABLE_LOGGING";
/// Base directory holding the archivable directories.
pub const ENV_PHOTOS_DIR: &str = "PHOTOS_DIR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` is usually `|name| std::env::var(name).ok()`; tests pass a map.
pub fn apply_env<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_RESPONSE_DELAY) {
        config.archive.response_delay_secs =
            value.trim().parse().map_err(|_| ConfigError::Env {
                name: ENV_RESPONSE_DELAY,
                value: value.clone(),
            })?;
    }

    if let Some(value) = lookup(ENV_ENABLE_LOGGING) {
        let flag: i64 = value.trim().parse().map_err(|_| ConfigError::Env {
            name: ENV_ENABLE_LOGGING,
            value: value.clone(),
        })?;
        config.observability.logging_enabled = flag != 0;
    }

    if let Some(value) = lookup(ENV_PHOTOS_DIR) {
        config.archive.base_dir = PathBuf::from(value);
    }

    Ok(())
}
