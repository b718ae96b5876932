//! Resource resolution: archive identifier → directory on disk.
//!
//! # Responsibilities
//! - Validate identifiers against a strict allow-list
//! - Join the identifier onto the base directory
//! - Confirm the directory exists and has not escaped the base via symlinks
//!
//! # Design Decisions
//! - Validation happens before any filesystem access
//! - Identifiers are passed to the archiver as an argument, so a leading
//!   `-` is rejected along with path syntax

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::archive::error::ArchiveError;

const MAX_ID_LEN: usize = 255;

/// A validated archive identifier.
///
/// Only ASCII letters, digits, `.`, `_` and `-` are accepted, and the first
/// character may not be `.` or `-`. Such a value is always a single, plain
/// path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let reject = |reason| ArchiveError::PathEscape {
            identifier: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(reject("empty identifier"));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(reject("identifier too long"));
        }
        if raw.starts_with('.') {
            return Err(reject("starts with '.'"));
        }
        if raw.starts_with('-') {
            return Err(reject("starts with '-'"));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        {
            return Err(reject("contains a disallowed character"));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ArchiveId {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// A request for one archive, scoped to a base directory.
#[derive(Debug, Clone)]
pub struct ArchiveRequest<'a> {
    pub identifier: ArchiveId,
    pub base_dir: &'a Path,
}

/// A directory confirmed to exist under the base directory.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    pub identifier: ArchiveId,
    pub absolute_path: PathBuf,
}

/// Map a request to an existing directory.
pub async fn resolve(request: ArchiveRequest<'_>) -> Result<ResolvedResource, ArchiveError> {
    let ArchiveRequest {
        identifier,
        base_dir,
    } = request;
    let joined = base_dir.join(&identifier);

    let metadata = match tokio::fs::metadata(&joined).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArchiveError::NotFound {
                identifier: identifier.to_string(),
            })
        }
        Err(source) => {
            return Err(ArchiveError::Io {
                path: joined,
                source,
            })
        }
    };

    if !metadata.is_dir() {
        return Err(ArchiveError::NotFound {
            identifier: identifier.to_string(),
        });
    }

    let canonical_base = canonicalize(base_dir).await?;
    let absolute_path = canonicalize(&joined).await?;
    if absolute_path.parent() != Some(canonical_base.as_path()) {
        return Err(ArchiveError::PathEscape {
            identifier: identifier.to_string(),
            reason: "resolves outside the base directory",
        });
    }

    Ok(ResolvedResource {
        identifier,
        absolute_path,
    })
}

async fn canonicalize(path: &Path) -> Result<PathBuf, ArchiveError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
}
