//! Input options for a blame analysis run.
//!
//! Everything the pipeline needs is carried by [`AnalysisOptions`]; the core
//! never reads flags, files or environment variables itself.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Key used to order the author list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Line count descending, ties by name ascending
    #[default]
    Lines,
    /// Author identity ascending
    Name,
    /// File count descending, ties by name ascending
    Files,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lines" | "line" => Ok(SortBy::Lines),
            "name" | "author" => Ok(SortBy::Name),
            "files" | "file" => Ok(SortBy::Files),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// How an author identity is rendered from blame metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorFormat {
    /// The `author` field only, e.g. `Jane Doe`
    #[default]
    Name,
    /// Name plus mail address, e.g. `Jane Doe <jane@example.com>`
    NameEmail,
}

impl FromStr for AuthorFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(AuthorFormat::Name),
            "name-email" | "email" => Ok(AuthorFormat::NameEmail),
            _ => Err(format!("Unknown author format: {}", s)),
        }
    }
}

/// Case-insensitive include/exclude lists applied to author identities.
///
/// Exclusion wins over inclusion. An empty include list admits everyone
/// not excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl AuthorFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only count the given author (may be called repeatedly).
    pub fn include(mut self, author: impl Into<String>) -> Self {
        self.include.push(author.into());
        self
    }

    /// Never count the given author (may be called repeatedly).
    pub fn exclude(mut self, author: impl Into<String>) -> Self {
        self.exclude.push(author.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether lines by `author` should be counted.
    pub fn admits(&self, author: &str) -> bool {
        let author = author.to_lowercase();
        if self.exclude.iter().any(|e| e.to_lowercase() == author) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|i| i.to_lowercase() == author)
    }
}

/// Options for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Number of concurrent blame workers (0 = twice the CPU count)
    pub concurrency: usize,
    /// Capacity of the result channel (0 = twice the worker count)
    pub channel_capacity: usize,
    /// When set, also collect per-file line counts for this exact identity
    pub focus_author: Option<String>,
    /// Author include/exclude lists
    pub author_filter: AuthorFilter,
    /// Passed to blame as `--since=<value>`
    pub since: Option<String>,
    /// Passed to blame as `--until=<value>`
    pub until: Option<String>,
    /// Authors (and focus-author files) below this many lines are dropped
    pub min_lines: usize,
    /// Ordering of the author list
    pub sort_by: SortBy,
    /// Maximum number of rows kept (0 = unlimited)
    pub max_results: usize,
    /// Report per-file blame failures as warnings
    pub verbose: bool,
    /// Identity rendering
    pub author_format: AuthorFormat,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            concurrency: 0,
            channel_capacity: 0,
            focus_author: None,
            author_filter: AuthorFilter::default(),
            since: None,
            until: None,
            min_lines: 1,
            sort_by: SortBy::default(),
            max_results: 0,
            verbose: false,
            author_format: AuthorFormat::default(),
        }
    }
}

impl AnalysisOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count (0 picks the default).
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    /// Set the result channel capacity (0 picks the default).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Collect per-file contributions for one author.
    pub fn focus_author(mut self, author: impl Into<String>) -> Self {
        self.focus_author = Some(author.into());
        self
    }

    /// Set author include/exclude lists.
    pub fn author_filter(mut self, filter: AuthorFilter) -> Self {
        self.author_filter = filter;
        self
    }

    /// Lower date bound for blame.
    pub fn since(mut self, date: impl Into<String>) -> Self {
        self.since = Some(date.into());
        self
    }

    /// Upper date bound for blame.
    pub fn until(mut self, date: impl Into<String>) -> Self {
        self.until = Some(date.into());
        self
    }

    pub fn min_lines(mut self, lines: usize) -> Self {
        self.min_lines = lines;
        self
    }

    pub fn sort_by(mut self, key: SortBy) -> Self {
        self.sort_by = key;
        self
    }

    pub fn max_results(mut self, limit: usize) -> Self {
        self.max_results = limit;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn author_format(mut self, format: AuthorFormat) -> Self {
        self.author_format = format;
        self
    }

    /// The worker count actually used, always at least 1.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            (num_cpus::get() * 2).max(1)
        } else {
            self.concurrency
        }
    }

    /// The result channel capacity actually used, always at least 1.
    pub fn effective_channel_capacity(&self) -> usize {
        if self.channel_capacity == 0 {
            self.effective_concurrency() * 2
        } else {
            self.channel_capacity
        }
    }
}
