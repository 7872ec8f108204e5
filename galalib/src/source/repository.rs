//! Repository root validation.

use std::path::{Path, PathBuf};

use crate::error::GalaError;
use crate::Result;

/// Check that `path` is an existing directory holding a git repository and
/// return its canonical form.
///
/// The directory itself must be the work tree root; a subdirectory of a
/// repository is rejected so blame paths stay relative to a known root.
pub fn validate_repository(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GalaError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(GalaError::NotADirectory(path.to_path_buf()));
    }

    let root = path.canonicalize()?;

    if !root.join(".git").exists() {
        return Err(GalaError::NotARepository {
            path: root,
            message: "no .git entry at this directory".to_string(),
        });
    }

    gix::open(&root).map_err(|e| GalaError::NotARepository {
        path: root.clone(),
        message: e.to_string(),
    })?;

    Ok(root)
}
