//! Single-consumer fold of blame results into running totals.
//!
//! The aggregator is the only owner of [`AggregateState`]. Workers hand
//! results over a bounded channel and never touch the counters, so nothing
//! here needs a lock.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::blame::FileBlameResult;
use crate::error::BlameError;

/// Mutable totals accumulated while results stream in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateState {
    /// Attributed lines across all successfully blamed files
    pub total_lines: usize,
    /// Author identity to attributed line count
    pub author_lines: HashMap<String, usize>,
    /// Author identity to the distinct files they own lines in
    pub author_files: HashMap<String, HashSet<PathBuf>>,
    /// Files blamed successfully
    pub files_processed: usize,
    /// Files whose blame failed (including interrupted ones)
    pub files_failed: usize,
    /// Files whose blame was killed by cancellation
    pub files_interrupted: usize,
    /// Per-file line counts for the focus author, if one is configured
    pub focus_files: HashMap<PathBuf, usize>,
}

/// Folds [`FileBlameResult`]s into an [`AggregateState`].
#[derive(Debug, Default)]
pub struct Aggregator {
    state: AggregateState,
    focus_author: Option<String>,
    verbose: bool,
}

impl Aggregator {
    pub fn new(focus_author: Option<String>, verbose: bool) -> Self {
        Self {
            state: AggregateState::default(),
            focus_author,
            verbose,
        }
    }

    /// Account for one file.
    ///
    /// A failed file only bumps the failure counters. A successful file is
    /// applied in full, so the state never holds part of a file.
    pub fn fold(&mut self, result: FileBlameResult) {
        let FileBlameResult {
            path,
            authors,
            error,
        } = result;

        if let Some(error) = error {
            self.state.files_failed += 1;
            if error == BlameError::Cancelled {
                self.state.files_interrupted += 1;
            }
            if self.verbose {
                warn!(path = %path.display(), %error, "error processing file");
            } else {
                debug!(path = %path.display(), %error, "error processing file");
            }
            return;
        }

        self.state.files_processed += 1;
        self.state.total_lines += authors.len();

        for author in authors {
            if self.focus_author.as_deref() == Some(author.as_str()) {
                *self.state.focus_files.entry(path.clone()).or_insert(0) += 1;
            }

            *self.state.author_lines.entry(author.clone()).or_insert(0) += 1;
            let files = self.state.author_files.entry(author).or_default();
            if !files.contains(&path) {
                files.insert(path.clone());
            }
        }
    }

    /// Drain the channel until every sender is gone, then hand back the state.
    ///
    /// This never observes cancellation: results already published by the
    /// workers are always counted.
    pub async fn consume(mut self, mut results: mpsc::Receiver<FileBlameResult>) -> AggregateState {
        while let Some(result) = results.recv().await {
            self.fold(result);
        }
        self.finish()
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn finish(self) -> AggregateState {
        self.state
    }
}
