//! Blame invocation: turn one file into a sequence of author identities.
//!
//! - **`Blamer`**: the seam the worker pool calls, once per file
//! - **`GitBlamer`**: the production implementation, one `git blame` per file
//! - **Porcelain parsing**: extract identities from line-porcelain output
//!
//! A `Blamer` distinguishes two kinds of failure. A file that cannot be
//! blamed (untracked, binary, unreadable) yields a [`FileBlameResult`] whose
//! `error` is set; the run carries on. A blamer that cannot work at all
//! (the executable is missing) returns `Err`, which stops the pool.

pub mod git;
pub mod porcelain;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BlameError;
use crate::Result;

pub use git::GitBlamer;
pub use porcelain::parse_line_porcelain;

/// Outcome of blaming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlameResult {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// One identity per attributed line, in file order (empty on failure)
    pub authors: Vec<String>,
    /// Set when the file could not be blamed
    pub error: Option<BlameError>,
}

impl FileBlameResult {
    pub fn success(path: impl Into<PathBuf>, authors: Vec<String>) -> Self {
        Self {
            path: path.into(),
            authors,
            error: None,
        }
    }

    pub fn failure(path: impl Into<PathBuf>, error: BlameError) -> Self {
        Self {
            path: path.into(),
            authors: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Produces blame results for individual files.
///
/// Implementations must stop promptly once `cancel` fires, reporting the
/// file as [`BlameError::Cancelled`].
#[async_trait]
pub trait Blamer: Send + Sync {
    async fn blame(&self, path: &Path, cancel: &CancellationToken) -> Result<FileBlameResult>;
}
