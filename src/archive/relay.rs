//! Throttled relay from archiver output to the response body.
//!
//! # Data Flow
//! ```text
//! archiver stdout ──read──▶ chunk buffer ──send──▶ body channel ──▶ hyper
//!                     ▲                                 │
//!                     └──────── pacing delay ◀──────────┘
//! ```
//!
//! # Design Decisions
//! - One read outstanding at a time; chunks leave in the order they were read
//! - End of stream is probed while the pacing delay runs, so the final chunk
//!   is never followed by a pointless wait
//! - Every await races client disconnect and server shutdown

use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::archive::error::{CancelReason, RelayError};
use crate::config::ArchiveConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Item type carried by the body channel.
pub type Chunk = Result<Bytes, std::io::Error>;

/// Totals for one relayed stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub bytes: u64,
    pub chunks: u64,
}

/// Copies a byte source into a body channel in paced chunks.
#[derive(Debug, Clone, Copy)]
pub struct ThrottledRelay {
    chunk_size: usize,
    delay: Duration,
}

impl ThrottledRelay {
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            delay,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.chunk_size, config.response_delay())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Relay `source` into `sink` until end of stream.
    ///
    /// Returns `RelayError::Cancelled` as soon as the receiving half of `sink`
    /// is dropped or `shutdown` fires. The caller owns cleanup of whatever
    /// produces `source`.
    pub async fn run<R>(
        &self,
        mut source: R,
        sink: &mpsc::Sender<Chunk>,
        shutdown: &mut ShutdownSignal,
    ) -> Result<RelayStats, RelayError>
    where
        R: AsyncRead + Unpin,
    {
        let mut stats = RelayStats::default();
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        loop {
            if filled == 0 {
                let n = cancellable(source.read(&mut buf), sink, shutdown)
                    .await?
                    .map_err(RelayError::Read)?;
                if n == 0 {
                    return Ok(stats);
                }
                filled = n;
            }

            let at_eof = top_up(&mut source, &mut buf, &mut filled)?;

            let chunk = Bytes::copy_from_slice(&buf[..filled]);
            filled = 0;
            let len = chunk.len();
            tracing::trace!(len, "Sending archive chunk");
            cancellable(sink.send(Ok(chunk)), sink, shutdown)
                .await?
                .map_err(|_| RelayError::Cancelled(CancelReason::ClientDisconnected))?;
            stats.bytes += len as u64;
            stats.chunks += 1;
            metrics::record_chunk(len);

            if at_eof {
                return Ok(stats);
            }

            // Pace, but stop early if the archiver finishes meanwhile.
            let deadline = Instant::now() + self.delay;
            let probed = cancellable(
                async {
                    tokio::select! {
                        biased;
                        read = source.read(&mut buf) => Some(read),
                        _ = tokio::time::sleep_until(deadline) => None,
                    }
                },
                sink,
                shutdown,
            )
            .await?;

            if let Some(read) = probed {
                let n = read.map_err(RelayError::Read)?;
                if n == 0 {
                    return Ok(stats);
                }
                filled = n;
                cancellable(tokio::time::sleep_until(deadline), sink, shutdown).await?;
            }
        }
    }
}

/// Await `fut` unless the client goes away or the server shuts down first.
async fn cancellable<F: Future>(
    fut: F,
    sink: &mpsc::Sender<Chunk>,
    shutdown: &mut ShutdownSignal,
) -> Result<F::Output, RelayError> {
    tokio::select! {
        biased;
        _ = shutdown.recv() => Err(RelayError::Cancelled(CancelReason::Shutdown)),
        _ = sink.closed() => Err(RelayError::Cancelled(CancelReason::ClientDisconnected)),
        out = fut => Ok(out),
    }
}

/// Append whatever the source can hand over without waiting.
///
/// Returns true once the source reports end of stream.
fn top_up<R>(source: &mut R, buf: &mut [u8], filled: &mut usize) -> Result<bool, RelayError>
where
    R: AsyncRead + Unpin,
{
    while *filled < buf.len() {
        match source.read(&mut buf[*filled..]).now_or_never() {
            Some(Ok(0)) => return Ok(true),
            Some(Ok(n)) => *filled += n,
            Some(Err(e)) => return Err(RelayError::Read(e)),
            None => break,
        }
    }
    Ok(false)
}
