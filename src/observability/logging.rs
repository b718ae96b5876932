//! Structured logging.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to
//! this crate and `tower_http`, or only warnings when logging is disabled.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive derived from configuration.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    if config.logging_enabled {
        format!(
            "archive_streamer={level},tower_http={level}",
            level = config.log_level
        )
    } else {
        "warn".to_string()
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
