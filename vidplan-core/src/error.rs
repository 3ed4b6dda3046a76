// ============================================================================
// vidplan-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the vidplan core library
//
// A single `CoreError` enum covers every failure the library can surface.
// Only the two collaborator boundaries (probing and encoding) produce fatal
// errors during a run; detection and parsing problems are logged and folded
// into neutral values by their callers.
//
// KEY COMPONENTS:
// - CoreError: The error enum (thiserror)
// - CoreResult: Result alias used throughout the crate
// - command_*_error: Constructors used at process boundaries

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the vidplan core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, io::Error),

    #[error("Failed to wait for {0}: {1}")]
    CommandWait(String, io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Probe failed for {path}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Unknown preset '{name}' (known presets: {known})")]
    UnknownPreset { name: String, known: String },

    #[error("Invalid timecode '{0}': expected S, M:S or H:M:S")]
    InvalidTimecode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Required dependency '{0}' not found or failed to execute")]
    DependencyNotFound(String),

    #[error("No processable video files found in {0}")]
    NoFilesFound(PathBuf),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Wraps a spawn failure for the named tool.
pub fn command_start_error(name: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(name.into(), err)
}

/// Wraps a failure while waiting on the named tool.
pub fn command_wait_error(name: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(name.into(), err)
}

/// Builds the error for a tool that exited unsuccessfully.
///
/// `stderr` is trimmed; an empty capture is reported as such so the message
/// never ends in a dangling colon.
pub fn command_failed_error(
    name: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    let stderr = stderr.into();
    let detail = match stderr.trim() {
        "" => "no diagnostic output captured".to_string(),
        trimmed => trimmed.to_string(),
    };
    CoreError::CommandFailed(name.into(), status, detail)
}
