//! Fixed-width pool of blame workers fed from a shared queue.
//!
//! ```text
//! feeder ──► bounded path queue ──► W workers ──► bounded result channel ──► aggregator
//! ```
//!
//! Workers compete for the next path, so slow files do not hold up the
//! others. Results leave in completion order, not input order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::blame::{Blamer, FileBlameResult};
use crate::error::GalaError;
use crate::Result;

/// Observer for run progress. Purely advisory.
pub trait Progress: Send + Sync {
    /// Called once before any file is dispatched.
    fn start(&self, _total: usize) {}

    /// Called after each file completes, with the running completed count.
    fn advance(&self, completed: usize);

    /// Called once after the last worker has exited.
    fn finish(&self) {}
}

/// Counts reported by a pool run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolReport {
    /// Paths taken off the queue by a worker
    pub dispatched: usize,
    /// Results published to the result channel
    pub completed: usize,
}

/// Runs a [`Blamer`] over many files with bounded parallelism.
pub struct WorkerPool<B> {
    blamer: Arc<B>,
    width: usize,
    progress: Option<Arc<dyn Progress>>,
}

impl<B: Blamer + 'static> WorkerPool<B> {
    /// Create a pool of `width` workers (at least one).
    pub fn new(blamer: Arc<B>, width: usize) -> Self {
        Self {
            blamer,
            width: width.max(1),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Blame every path once, publishing each result to `results`.
    ///
    /// Once `cancel` fires, no new paths are claimed and in-flight blames are
    /// killed; results already sent stay in the channel for the consumer.
    /// The first launch-level failure cancels the rest of the pool and is
    /// returned. Per-file failures are published, not returned.
    pub async fn run(
        self,
        files: Vec<PathBuf>,
        cancel: CancellationToken,
        results: mpsc::Sender<FileBlameResult>,
    ) -> Result<PoolReport> {
        if cancel.is_cancelled() {
            return Err(GalaError::Cancelled);
        }

        let pool_cancel = cancel.child_token();
        let (queue_tx, queue_rx) = mpsc::channel::<PathBuf>(self.width);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let dispatched = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        if let Some(progress) = &self.progress {
            progress.start(files.len());
        }

        let feeder = {
            let cancel = pool_cancel.clone();
            tokio::spawn(async move {
                for path in files {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = queue_tx.send(path) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            })
        };

        let mut workers = JoinSet::new();
        for id in 0..self.width {
            let blamer = Arc::clone(&self.blamer);
            let queue = Arc::clone(&queue_rx);
            let results = results.clone();
            let cancel = pool_cancel.clone();
            let dispatched = Arc::clone(&dispatched);
            let completed = Arc::clone(&completed);
            let progress = self.progress.clone();

            workers.spawn(async move {
                loop {
                    let next = {
                        let mut queue = queue.lock().await;
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            path = queue.recv() => path,
                        }
                    };
                    let Some(path) = next else { break };
                    dispatched.fetch_add(1, Ordering::SeqCst);

                    let result = match blamer.blame(&path, &cancel).await {
                        Ok(result) => result,
                        Err(e) => {
                            cancel.cancel();
                            return Err(e);
                        }
                    };

                    if results.send(result).await.is_err() {
                        warn!(worker = id, "result channel closed, stopping worker");
                        break;
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = &progress {
                        progress.advance(done);
                    }
                }
                debug!(worker = id, "worker finished");
                Ok(())
            });
        }

        // Channel closure is driven by the workers from here on.
        drop(queue_rx);
        drop(results);

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    pool_cancel.cancel();
                    Err(GalaError::WorkerPanicked(e.to_string()))
                }
            };
            if let Err(e) = outcome {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        if let Err(e) = feeder.await {
            warn!(error = %e, "file feeder task failed");
        }

        if let Some(progress) = &self.progress {
            progress.finish();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(PoolReport {
                dispatched: dispatched.load(Ordering::SeqCst),
                completed: completed.load(Ordering::SeqCst),
            }),
        }
    }
}
