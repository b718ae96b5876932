//! On-demand archive streaming.
//!
//! # Data Flow
//! ```text
//! identifier
//!     → resolver.rs (validate, join onto base dir, check existence)
//!     → process.rs (spawn archiver in base dir, pipe stdout)
//!     → relay.rs (paced chunks into the body channel)
//!     → streamer.rs (worker owning the process; terminate + reap on exit)
//!     → tracker.rs (active stream count, shutdown drain)
//! ```
//!
//! # Design Decisions
//! - Nothing is buffered beyond a single chunk
//! - One archiver per request, never shared
//! - The body ends only after the archiver has been reaped

pub mod error;
pub mod process;
pub mod relay;
pub mod resolver;
pub mod streamer;
pub mod tracker;

pub use error::{ArchiveError, CancelReason, RelayError};
pub use process::ArchiveProcess;
pub use relay::{Chunk, RelayStats, ThrottledRelay};
pub use resolver::{resolve, ArchiveId, ArchiveRequest, ResolvedResource};
pub use streamer::{ArchiveStream, ArchiveStreamer, StreamOutcome};
pub use tracker::{StreamGuard, StreamId, StreamTracker};
