//! Route handlers.

use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::http::response::{archive_response, error_response};
use crate::http::server::AppState;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    serve_page(&state.pages.index_path).await
}

/// `GET /404.html/` (or the configured not-found route)
pub async fn not_found_page(State(state): State<AppState>) -> Response {
    serve_page(&state.pages.not_found_path).await
}

/// `GET /archive/{identifier}/`
pub async fn archive(
    State(state): State<AppState>,
    UrlPath(identifier): UrlPath<String>,
) -> Response {
    match state.streamer.open(&identifier).await {
        Ok(stream) => archive_response(stream),
        Err(err) => error_response(&err, &state.streamer.config().not_found_route),
    }
}

async fn serve_page(path: &Path) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Html(contents).into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Page unavailable").into_response()
        }
    }
}
