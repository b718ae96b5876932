//! Archiver process supervision.
//!
//! # Responsibilities
//! - Spawn one archiver per request, scoped to the base directory
//! - Expose its stdout as an async byte stream
//! - Terminate and reap it on every exit path
//!
//! # Design Decisions
//! - stderr is discarded so a chatty archiver can never block on a full pipe
//! - `terminate()` is idempotent; callers invoke it once on every path and
//!   `Drop` covers the paths where no caller is left (task abort, panic)
//! - Exit status is logged but never drives control flow

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdout, Command};

use crate::archive::error::ArchiveError;
use crate::archive::resolver::ResolvedResource;
use crate::config::ArchiverConfig;

/// A running (or reaped) archiver subprocess.
#[derive(Debug)]
pub struct ArchiveProcess {
    child: Child,
    stdout: ChildStdout,
    pid: Option<u32>,
    status: Option<ExitStatus>,
}

impl ArchiveProcess {
    /// Spawn the archiver for `resource` with `base_dir` as working directory.
    pub fn start(
        resource: &ResolvedResource,
        base_dir: &Path,
        archiver: &ArchiverConfig,
    ) -> Result<Self, ArchiveError> {
        let spawn_error = |source| ArchiveError::Spawn {
            program: archiver.program.clone(),
            source,
        };

        let mut child = Command::new(&archiver.program)
            .args(&archiver.args)
            .arg(resource.identifier.as_str())
            .current_dir(base_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(io::Error::other("archiver stdout was not captured")))?;
        let pid = child.id();

        tracing::debug!(
            pid = ?pid,
            program = %archiver.program,
            identifier = %resource.identifier,
            "Archiver started"
        );

        Ok(Self {
            child,
            stdout,
            pid,
            status: None,
        })
    }

    /// OS process id, if the process had not been reaped when spawned.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// The archiver's standard output.
    pub fn stdout(&mut self) -> &mut ChildStdout {
        &mut self.stdout
    }

    /// Exit status, once reaped.
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Kill the archiver if it is still running and wait for it to be reaped.
    ///
    /// Safe to call any number of times; later calls return the cached status.
    pub async fn terminate(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }

        if self.child.try_wait()?.is_none() {
            match self.child.start_kill() {
                Ok(()) => tracing::debug!(pid = ?self.pid, "Archiver killed"),
                // Exited between try_wait and start_kill.
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
                Err(e) => return Err(e),
            }
        }

        let status = self.child.wait().await?;
        self.status = Some(status);
        tracing::debug!(pid = ?self.pid, status = %status, "Archiver reaped");
        Ok(status)
    }
}

impl Drop for ArchiveProcess {
    fn drop(&mut self) {
        if self.status.is_none() {
            // kill_on_drop also fires here; tokio reaps the orphan in the background.
            let _ = self.child.start_kill();
            tracing::warn!(pid = ?self.pid, "Archiver dropped without being reaped");
        }
    }
}
