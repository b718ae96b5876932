//! Response construction.
//!
//! # Responsibilities
//! - Build the streaming archive response and its headers
//! - Map archive errors to HTTP outcomes
//!
//! # Design Decisions
//! - Unknown and rejected identifiers redirect (302) to the not-found page
//!   rather than answering 404, for compatibility with existing clients
//! - Spawn and filesystem failures are 500 with a short plain-text body

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::archive::{ArchiveError, ArchiveStream};

/// Content type sent with every archive.
pub const ARCHIVE_CONTENT_TYPE: &str = "multipart/form-data";

/// `Content-Disposition` value naming the download after the identifier.
pub fn content_disposition(identifier: &str) -> String {
    format!("filename=\"{identifier}.zip\"")
}

/// 200 response whose body is the live archive stream.
pub fn archive_response(stream: ArchiveStream) -> Response {
    let disposition = match HeaderValue::from_str(&content_disposition(stream.identifier().as_str()))
    {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "Invalid Content-Disposition header");
            // Dropping the stream cancels its relay and reaps the archiver.
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(ARCHIVE_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        stream.into_body(),
    )
        .into_response()
}

/// Redirect to the not-found page.
pub fn redirect_to_not_found(route: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, route)]).into_response()
}

/// Map a pre-stream failure to a response.
pub fn error_response(err: &ArchiveError, not_found_route: &str) -> Response {
    if err.is_not_found() {
        return redirect_to_not_found(not_found_route);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "Archive could not be created").into_response()
}
