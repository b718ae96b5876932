//! Error types for the archive pipeline.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before any archive byte is streamed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No directory exists for the identifier.
    #[error("archive {identifier:?} not found")]
    NotFound { identifier: String },

    /// The identifier is malformed or resolves outside the base directory.
    #[error("archive identifier {identifier:?} rejected: {reason}")]
    PathEscape {
        identifier: String,
        reason: &'static str,
    },

    /// The archiver process could not be launched.
    #[error("failed to spawn archiver {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Unexpected filesystem error while resolving.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    /// Whether the client should be sent to the not-found page.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::PathEscape { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::PathEscape { .. } => "path_escape",
            Self::Spawn { .. } => "spawn",
            Self::Io { .. } => "io",
        }
    }
}

/// Why a stream stopped before end of archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The response body was dropped (client went away).
    ClientDisconnected,
    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::ClientDisconnected => write!(f, "client disconnected"),
            CancelReason::Shutdown => write!(f, "server shutting down"),
        }
    }
}

/// Errors that end a relay loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("stream cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("failed to read archiver output: {0}")]
    Read(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = ArchiveError::NotFound {
            identifier: "abc".into(),
        };
        let escape = ArchiveError::PathEscape {
            identifier: "../etc".into(),
            reason: "starts with '.'",
        };
        let spawn = ArchiveError::Spawn {
            program: "zip".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        assert!(missing.is_not_found());
        assert!(escape.is_not_found());
        assert!(!spawn.is_not_found());
        assert_eq!(spawn.kind(), "spawn");
    }

    #[test]
    fn test_error_display() {
        let err = RelayError::Cancelled(CancelReason::ClientDisconnected);
        assert_eq!(err.to_string(), "stream cancelled: client disconnected");

        let err = ArchiveError::PathEscape {
            identifier: "a/b".into(),
            reason: "contains a disallowed character",
        };
        assert!(err.to_string().contains("a/b"));
    }
}
