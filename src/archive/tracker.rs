//! In-flight stream tracking.
//!
//! # Responsibilities
//! - Generate unique stream IDs for tracing
//! - Count active streams (and their archivers)
//! - Let shutdown wait until every archiver has been reaped

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::observability::metrics;

/// Global atomic counter for stream IDs.
static STREAM_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one archive stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    /// Generate a new unique stream ID.
    pub fn new() -> Self {
        Self(STREAM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Tracks active streams for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct StreamTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    active: AtomicU64,
    drained: Notify,
}

impl StreamTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new stream. Returns a guard that decrements on drop.
    pub fn track(&self) -> StreamGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        metrics::stream_started();
        StreamGuard {
            inner: Arc::clone(&self.inner),
            id: StreamId::new(),
        }
    }

    /// Get current active stream count.
    pub fn active_count(&self) -> u64 {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Wait until no stream is active, or `timeout` elapses.
    ///
    /// Returns true if drained.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let drain = async {
            loop {
                let notified = self.inner.drained.notified();
                if self.active_count() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, drain).await.is_ok()
    }
}

/// Guard that tracks a stream's lifetime.
#[derive(Debug)]
pub struct StreamGuard {
    inner: Arc<Inner>,
    id: StreamId,
}

impl StreamGuard {
    pub fn id(&self) -> StreamId {
        self.id
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        metrics::stream_finished();
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
        tracing::trace!(stream_id = %self.id, "Stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_unique() {
        let id1 = StreamId::new();
        let id2 = StreamId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("stream-"));
    }

    #[test]
    fn tracker_counts() {
        let tracker = StreamTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);
        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn drain_waits_for_last_guard() {
        let tracker = StreamTracker::new();
        assert!(tracker.wait_for_drain(Duration::from_millis(10)).await);

        let guard = tracker.track();
        assert!(!tracker.wait_for_drain(Duration::from_millis(20)).await);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });
        assert!(tracker.wait_for_drain(Duration::from_secs(1)).await);
    }
}
