//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown
//! - Wait for in-flight archive streams to reap their archivers

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::archive::{ArchiveStreamer, StreamTracker};
use crate::config::{PagesConfig, ServerConfig};
use crate::http::handlers;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub streamer: Arc<ArchiveStreamer>,
    pub pages: Arc<PagesConfig>,
}

/// HTTP server for archive downloads.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    shutdown: Shutdown,
    tracker: StreamTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// `shutdown` stops the listener and cancels in-flight streams.
    pub fn new(config: ServerConfig, shutdown: Shutdown) -> Self {
        let tracker = StreamTracker::new();
        let streamer = ArchiveStreamer::new(
            Arc::new(config.archive.clone()),
            shutdown.clone(),
            tracker.clone(),
        );

        let state = AppState {
            streamer: Arc::new(streamer),
            pages: Arc::new(config.pages.clone()),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            shutdown,
            tracker,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No timeout layer: archives stream for as long as they take.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/archive/{identifier}/", get(handlers::archive))
            .route(&config.archive.not_found_route, get(handlers::not_found_page))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_dir = %self.config.archive.base_dir.display(),
            delay = ?self.config.archive.response_delay(),
            "HTTP server starting"
        );

        let mut signal = self.shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { signal.recv().await })
            .await?;

        let grace = self.config.archive.shutdown_grace();
        if !self.tracker.wait_for_drain(grace).await {
            tracing::warn!(
                active_streams = self.tracker.active_count(),
                "Shutdown grace period elapsed with streams still active"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Tracker for this server's in-flight streams.
    pub fn tracker(&self) -> &StreamTracker {
        &self.tracker
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
