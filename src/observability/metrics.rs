//! Metrics collection and exposition.
//!
//! # Metrics
//! - `archive_streams_total` (counter): finished streams by outcome
//! - `archive_rejections_total` (counter): requests refused before streaming, by reason
//! - `archive_bytes_sent_total` (counter): archive bytes handed to the transport
//! - `archive_active_streams` (gauge): streams whose archiver is still owned
//! - `archive_stream_duration_seconds` (histogram): spawn to reap
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so tests and
//!   deployments without a metrics endpoint pay nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn stream_started() {
    metrics::gauge!("archive_active_streams").increment(1.0);
}

pub fn stream_finished() {
    metrics::gauge!("archive_active_streams").decrement(1.0);
}

/// Record one chunk handed to the response body.
pub fn record_chunk(len: usize) {
    metrics::counter!("archive_bytes_sent_total").increment(len as u64);
}

/// Record a stream that reached a terminal state.
pub fn record_stream(outcome: &'static str, started: Instant) {
    metrics::counter!("archive_streams_total", "outcome" => outcome).increment(1);
    metrics::histogram!("archive_stream_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

/// Record a request refused before any archive byte was produced.
pub fn record_rejection(reason: &'static str) {
    metrics::counter!("archive_rejections_total", "reason" => reason).increment(1);
}
