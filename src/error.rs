// src/error.rs
// Core error taxonomy for the session manager.
//
// Every failure is local to the operation that raised it: a failed launch
// leaves no session behind, a failed stdin write leaves the session running,
// and cleanup failures are logged rather than surfaced.

use thiserror::Error;

/// Errors produced by the session core.
#[derive(Debug, Error)]
pub enum RunError {
    /// Artifact creation or process spawn failed; no session was registered.
    #[error("launch failed: {0}")]
    LaunchFailure(String),

    /// No live session exists for the given identifier.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Input was sent to a session whose process already exited.
    #[error("process exited: {0}")]
    ProcessExited(String),

    /// A stream pump hit a pipe error mid-run.
    #[error("stream read failed: {0}")]
    StreamReadFailure(String),

    /// Writing to the child's stdin failed; the session keeps running.
    #[error("stdin write failed: {0}")]
    StdinWriteFailure(String),

    /// Artifact deletion failed. Logged only, never fatal.
    #[error("cleanup failed: {0}")]
    CleanupFailure(String),
}

pub type RunResult<T> = Result<T, RunError>;
