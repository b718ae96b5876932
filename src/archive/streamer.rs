//! Per-request archive streams.
//!
//! # State Machine
//! ```text
//! RESOLVING ──miss/reject──▶ FAILED (redirect, nothing spawned)
//!     │
//!     ▼
//! SPAWNING ──spawn error──▶ FAILED (500)
//!     │
//!     ▼
//! STREAMING ──end of stream──▶ COMPLETED
//!     ├──────disconnect/shutdown──▶ CANCELLED
//!     └──────read error──────────▶ FAILED
//! ```
//!
//! Every path out of STREAMING goes through `ArchiveProcess::terminate`
//! before the body channel is closed.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::archive::error::{ArchiveError, CancelReason, RelayError};
use crate::archive::process::ArchiveProcess;
use crate::archive::relay::{Chunk, RelayStats, ThrottledRelay};
use crate::archive::resolver::{resolve, ArchiveId, ArchiveRequest};
use crate::archive::tracker::{StreamGuard, StreamId, StreamTracker};
use crate::config::ArchiveConfig;
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::observability::metrics;

/// Terminal state of a stream that got as far as STREAMING.
#[derive(Debug)]
pub enum StreamOutcome {
    Completed(RelayStats),
    Cancelled(CancelReason),
    Failed(String),
}

impl StreamOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StreamOutcome::Completed(_) => "completed",
            StreamOutcome::Cancelled(_) => "cancelled",
            StreamOutcome::Failed(_) => "failed",
        }
    }
}

/// Opens archive streams against one base directory.
#[derive(Debug, Clone)]
pub struct ArchiveStreamer {
    config: Arc<ArchiveConfig>,
    relay: ThrottledRelay,
    shutdown: Shutdown,
    tracker: StreamTracker,
}

impl ArchiveStreamer {
    pub fn new(config: Arc<ArchiveConfig>, shutdown: Shutdown, tracker: StreamTracker) -> Self {
        let relay = ThrottledRelay::from_config(&config);
        Self {
            config,
            relay,
            shutdown,
            tracker,
        }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn tracker(&self) -> &StreamTracker {
        &self.tracker
    }

    /// Resolve `identifier`, start its archiver and begin relaying.
    ///
    /// Errors are returned before any body exists; once this returns `Ok`,
    /// the only remaining signal to the client is the body itself.
    pub async fn open(&self, identifier: &str) -> Result<ArchiveStream, ArchiveError> {
        let result = self.start(identifier).await;
        if let Err(err) = &result {
            match err {
                ArchiveError::NotFound { .. } => {
                    tracing::debug!(identifier, "Archive not found")
                }
                ArchiveError::PathEscape { reason, .. } => {
                    tracing::warn!(identifier, reason, "Rejected archive identifier")
                }
                ArchiveError::Spawn { .. } | ArchiveError::Io { .. } => {
                    tracing::error!(identifier, error = %err, "Failed to start archive stream")
                }
            }
            metrics::record_rejection(err.kind());
        }
        result
    }

    async fn start(&self, raw: &str) -> Result<ArchiveStream, ArchiveError> {
        let identifier = ArchiveId::parse(raw)?;
        let resource = resolve(ArchiveRequest {
            identifier,
            base_dir: &self.config.base_dir,
        })
        .await?;

        let process = ArchiveProcess::start(&resource, &self.config.base_dir, &self.config.archiver)?;
        let pid = process.id();
        let guard = self.tracker.track();
        let stream_id = guard.id();

        tracing::info!(
            stream_id = %stream_id,
            identifier = %resource.identifier,
            pid = ?pid,
            "Streaming archive"
        );

        let (tx, rx) = mpsc::channel(1);
        let (finished_tx, finished_rx) = oneshot::channel();
        let worker = Worker {
            process,
            tx,
            finished: finished_tx,
            relay: self.relay,
            shutdown: self.shutdown.subscribe(),
            guard,
            started: Instant::now(),
        };
        let handle = tokio::spawn(worker.run());

        Ok(ArchiveStream {
            identifier: resource.identifier,
            stream_id,
            pid,
            body: rx,
            finished: finished_rx,
            worker: handle,
        })
    }
}

/// A started stream: body receiver plus the worker driving it.
#[derive(Debug)]
pub struct ArchiveStream {
    identifier: ArchiveId,
    stream_id: StreamId,
    pid: Option<u32>,
    body: mpsc::Receiver<Chunk>,
    finished: oneshot::Receiver<bool>,
    worker: JoinHandle<StreamOutcome>,
}

impl ArchiveStream {
    pub fn identifier(&self) -> &ArchiveId {
        &self.identifier
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Archiver process id.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn into_parts(self) -> (mpsc::Receiver<Chunk>, JoinHandle<StreamOutcome>) {
        (self.body, self.worker)
    }

    /// Convert into a response body. The worker keeps running detached.
    ///
    /// Dropping the body (client gone) cancels the worker's relay. A stream
    /// that stops short of the end of the archive ends the body with an
    /// error, so the transport aborts instead of sending a clean end of body.
    pub fn into_body(self) -> Body {
        let state = (self.body, Some(self.finished));
        let chunks = futures_util::stream::unfold(state, |(mut rx, finished)| async move {
            if let Some(chunk) = rx.recv().await {
                return Some((chunk, (rx, finished)));
            }
            let completed = match finished {
                Some(finished) => finished.await.unwrap_or(false),
                None => true,
            };
            if completed {
                None
            } else {
                let abort = std::io::Error::other("archive stream aborted");
                Some((Err(abort), (rx, None)))
            }
        });
        Body::from_stream(chunks)
    }
}

/// Owns everything one stream needs for the duration of STREAMING.
struct Worker {
    process: ArchiveProcess,
    tx: mpsc::Sender<Chunk>,
    finished: oneshot::Sender<bool>,
    relay: ThrottledRelay,
    shutdown: ShutdownSignal,
    guard: StreamGuard,
    started: Instant,
}

impl Worker {
    async fn run(self) -> StreamOutcome {
        let Worker {
            mut process,
            tx,
            finished,
            relay,
            mut shutdown,
            guard,
            started,
        } = self;
        let stream_id = guard.id();

        let result = relay.run(process.stdout(), &tx, &mut shutdown).await;

        let outcome = match result {
            Ok(stats) => {
                tracing::info!(
                    stream_id = %stream_id,
                    bytes = stats.bytes,
                    chunks = stats.chunks,
                    "Archive sent"
                );
                StreamOutcome::Completed(stats)
            }
            Err(RelayError::Cancelled(reason)) => {
                tracing::info!(stream_id = %stream_id, reason = %reason, "Download was interrupted");
                StreamOutcome::Cancelled(reason)
            }
            Err(RelayError::Read(e)) => {
                tracing::error!(stream_id = %stream_id, error = %e, "Archiver output failed");
                StreamOutcome::Failed(e.to_string())
            }
        };

        match process.terminate().await {
            Ok(status) => tracing::debug!(stream_id = %stream_id, status = %status, "Archiver finished"),
            Err(e) => tracing::error!(stream_id = %stream_id, error = %e, "Failed to reap archiver"),
        }

        // End of body only after the archiver is gone.
        let _ = finished.send(matches!(outcome, StreamOutcome::Completed(_)));
        drop(tx);
        metrics::record_stream(outcome.label(), started);
        drop(guard);
        outcome
    }
}
