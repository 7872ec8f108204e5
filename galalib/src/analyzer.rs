//! High-level analysis API.
//!
//! [`analyze`] is the main entry point: it validates the repository, finds
//! the files to blame, runs the pipeline and returns the finished result.
//! [`run_pipeline`] is the same minus discovery, for callers that already
//! have a file list or want to supply their own [`Blamer`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::blame::{Blamer, GitBlamer};
use crate::error::GalaError;
use crate::options::AnalysisOptions;
use crate::pipeline::{finalize, Aggregator, Progress, RunSummary, WorkerPool};
use crate::source::{discover_files, validate_repository, FilterConfig};
use crate::stats::AnalysisResult;
use crate::Result;

/// Analyze a repository with `git blame`.
///
/// `filter` supplies the exclusion patterns; the repository's `.gitignore`
/// is added to it here. Cancelling `cancel` stops the run early and yields a
/// result with `complete == false`.
///
/// # Example
///
/// ```rust,ignore
/// use galalib::{analyze, AnalysisOptions, FilterConfig};
/// use tokio_util::sync::CancellationToken;
///
/// let result = analyze(
///     ".",
///     FilterConfig::with_defaults(),
///     &AnalysisOptions::new().min_lines(10),
///     CancellationToken::new(),
///     None,
/// )
/// .await?;
/// for author in &result.authors {
///     println!("{} {}", author.line_count, author.name);
/// }
/// ```
pub async fn analyze(
    root: impl AsRef<Path>,
    filter: FilterConfig,
    options: &AnalysisOptions,
    cancel: CancellationToken,
    progress: Option<Arc<dyn Progress>>,
) -> Result<AnalysisResult> {
    let root = validate_repository(root)?;
    let filter = filter.load_gitignore(&root)?;

    info!(root = %root.display(), "scanning directory");
    if let Some(focus) = &options.focus_author {
        info!(author = %focus, "analyzing contributions by user");
    }

    let files = discover_files(&root, &filter)?;
    info!(files = files.len(), "found files to analyze");
    if files.is_empty() {
        warn!("no files found to analyze");
    }

    let blamer = Arc::new(GitBlamer::new(&root, options));
    run_pipeline(blamer, root, files, options, cancel, progress).await
}

/// Blame `files` (relative to `root`) and aggregate the results.
///
/// The aggregator always drains every published result, even when the pool
/// stops early, so an interrupted run still reports whole files only.
pub async fn run_pipeline<B: Blamer + 'static>(
    blamer: Arc<B>,
    root: impl Into<PathBuf>,
    files: Vec<PathBuf>,
    options: &AnalysisOptions,
    cancel: CancellationToken,
    progress: Option<Arc<dyn Progress>>,
) -> Result<AnalysisResult> {
    let started = Instant::now();
    let total_files = files.len();

    let (results_tx, results_rx) = mpsc::channel(options.effective_channel_capacity());
    let aggregator = Aggregator::new(options.focus_author.clone(), options.verbose);
    let aggregation = tokio::spawn(aggregator.consume(results_rx));

    let mut pool = WorkerPool::new(blamer, options.effective_concurrency());
    if let Some(progress) = progress {
        pool = pool.with_progress(progress);
    }
    info!(workers = pool.width(), files = total_files, "starting blame workers");

    let pool_outcome = pool.run(files, cancel.clone(), results_tx).await;
    let state = aggregation
        .await
        .map_err(|e| GalaError::WorkerPanicked(e.to_string()))?;
    let report = pool_outcome?;

    let complete = report.completed == total_files && state.files_interrupted == 0;
    if !complete {
        warn!(
            processed = state.files_processed,
            dispatched = report.dispatched,
            total = total_files,
            "analysis interrupted, results are partial"
        );
    }

    Ok(finalize(
        state,
        options,
        RunSummary {
            repository: root.into(),
            total_files,
            elapsed: started.elapsed(),
            complete,
        },
    ))
}
