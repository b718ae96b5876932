//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delay >= 0, chunk size > 0)
//! - Check addresses and routes are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("archive.response_delay_secs must be a finite value >= 0, got {0}")]
    InvalidDelay(f64),

    #[error("archive.chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("archive.archiver.program must not be empty")]
    EmptyArchiver,

    #[error("archive.not_found_route must be a path distinct from '/' and '/archive/...', got {0:?}")]
    InvalidRoute(String),

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let archive = &config.archive;

    let delay = archive.response_delay_secs;
    if !delay.is_finite() || delay < 0.0 {
        errors.push(ValidationError::InvalidDelay(delay));
    }

    if archive.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }

    if archive.archiver.program.trim().is_empty() {
        errors.push(ValidationError::EmptyArchiver);
    }

    let route = archive.not_found_route.as_str();
    if !route.starts_with('/') || route == "/" || route.starts_with("/archive/") {
        errors.push(ValidationError::InvalidRoute(archive.not_found_route.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
