//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Cancel in-flight streams
//!     → Wait for archivers to be reaped → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown has a grace period: exit proceeds after the deadline even if
//!   a stream has not drained

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
