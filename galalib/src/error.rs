//! Error types for galalib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Per-file blame failures are not represented here; they travel inside
/// [`FileBlameResult`](crate::blame::FileBlameResult) as a [`BlameError`].
#[derive(Error, Debug)]
pub enum GalaError {
    /// Path does not exist
    #[error("directory '{0}' does not exist")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// Directory is not the root of a git repository
    #[error("'{path}' is not a git repository: {message}")]
    NotARepository { path: PathBuf, message: String },

    /// Invalid glob pattern
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// The blame executable could not be started at all
    #[error("failed to launch '{program}': {source}")]
    BlameLaunch {
        program: String,
        source: std::io::Error,
    },

    /// Cancellation fired before any work was dispatched
    #[error("analysis cancelled before it started")]
    Cancelled,

    /// A worker task panicked or was aborted
    #[error("worker task failed: {0}")]
    WorkerPanicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable failure to blame one file.
///
/// The file is left out of the aggregate; the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlameError {
    /// The blame command ran but exited unsuccessfully
    #[error("blame exited with {}: {stderr}", describe_exit(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Spawning or talking to the blame process failed
    #[error("blame I/O error: {0}")]
    Io(String),

    /// The invocation was killed because the run was cancelled
    #[error("blame cancelled")]
    Cancelled,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}
