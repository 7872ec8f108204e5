//! The concurrent blame pipeline.
//!
//! - **Worker pool**: fans files out across W concurrent blame invocations
//! - **Aggregator**: fans results back in through one consumer
//! - **Finalizer**: threshold, sort and limit into an `AnalysisResult`

pub mod aggregator;
pub mod finalize;
pub mod pool;

pub use aggregator::{AggregateState, Aggregator};
pub use finalize::{finalize, sort_authors, RunSummary};
pub use pool::{PoolReport, Progress, WorkerPool};
