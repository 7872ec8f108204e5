//! # galalib
//!
//! Attribute every line of a git repository to the author who last touched
//! it, by running `git blame` over many files at once.
//!
//! ## Overview
//!
//! The analysis is a fan-out/fan-in pipeline:
//!
//! - **Source**: validate the repository and discover the files to blame
//! - **Blame**: one `git blame --line-porcelain` per file, parsed into author
//!   identities
//! - **Pool**: a fixed number of workers claim files from a shared queue
//! - **Aggregator**: a single consumer folds results into running totals
//! - **Finalizer**: threshold, sort and limit into an [`AnalysisResult`]
//!
//! Cancellation is cooperative: once the token fires no new files are
//! claimed, in-flight blames are killed, and everything already published
//! is still counted. The result then reports `complete == false`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use galalib::{analyze, AnalysisOptions, FilterConfig, SortBy};
//! use tokio_util::sync::CancellationToken;
//!
//! let options = AnalysisOptions::new()
//!     .concurrency(8)
//!     .sort_by(SortBy::Files)
//!     .max_results(10);
//! let result = analyze(
//!     "path/to/repo",
//!     FilterConfig::with_defaults().exclude("*.pb.go")?,
//!     &options,
//!     CancellationToken::new(),
//!     None,
//! )
//! .await?;
//!
//! for author in &result.authors {
//!     println!("{:>8} {:5.1}% {}", author.line_count, author.percentage, author.name);
//! }
//! ```

pub mod analyzer;
pub mod blame;
pub mod error;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod stats;

pub use analyzer::{analyze, run_pipeline};
pub use blame::{Blamer, FileBlameResult, GitBlamer};
pub use error::{BlameError, GalaError};
pub use options::{AnalysisOptions, AuthorFilter, AuthorFormat, SortBy};
pub use output::{format_number, ReportTable, TableRow};
pub use pipeline::{Progress, WorkerPool};
pub use source::{discover_files, validate_repository, FilterConfig, DEFAULT_EXCLUDE_PATTERNS};
pub use stats::{AnalysisResult, AuthorStats, FileContribution};

/// Result type for galalib operations
pub type Result<T> = std::result::Result<T, GalaError>;
