//! Result types produced by a finished analysis.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lines attributed to one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorStats {
    /// Author identity, exactly as blame reported it
    pub name: String,
    /// Attributed lines
    pub line_count: usize,
    /// Distinct files containing at least one of those lines
    pub file_count: usize,
    /// Share of all attributed lines, 0-100
    pub percentage: f64,
}

/// Lines the focus author owns in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContribution {
    /// Path relative to the repository root
    pub path: String,
    pub line_count: usize,
}

/// Immutable snapshot of a completed (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Authors after threshold, sort and limit
    pub authors: Vec<AuthorStats>,
    /// Focus author identity, if one was configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_author: Option<String>,
    /// Per-file lines for the focus author, after threshold, sort and limit
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub user_contributions: Vec<FileContribution>,
    /// Attributed lines across every successfully blamed file
    pub total_lines: usize,
    /// Files blamed successfully
    pub files_processed: usize,
    /// Files whose blame failed
    pub files_failed: usize,
    /// Files handed to the pipeline, failed ones included
    pub total_files: usize,
    /// Wall-clock time of the pipeline in milliseconds
    pub processing_time_ms: u64,
    /// Canonical repository root
    pub repository: PathBuf,
    pub generated_at: DateTime<Utc>,
    /// False when cancellation stopped the run before every file was blamed
    pub complete: bool,
}

impl AnalysisResult {
    /// Sum of the focus author's per-file lines (after filtering).
    pub fn total_user_lines(&self) -> usize {
        self.user_contributions.iter().map(|c| c.line_count).sum()
    }
}
