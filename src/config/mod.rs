//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc to request handlers
//! ```
//!
//! # Design Decisions
//! - Config is read once before serving; handlers never touch the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, load_config, read_config, ConfigError};
pub use schema::ArchiveConfig;
pub use schema::ArchiverConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PagesConfig;
pub use schema::ServerConfig;
pub use validation::{validate_config, ValidationError};
