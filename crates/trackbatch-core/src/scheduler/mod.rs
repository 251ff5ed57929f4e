//! Batch scheduler.
//!
//! Runs one task per batch with a bounded number in flight. Each task drives
//! the retry orchestrator over the batch client and persists the outcome:
//! classified groups on success, the whole batch to the fallback file when it
//! is given up, nothing when the run is cancelled.

mod parallel;
mod progress;
mod run;

pub use parallel::run_batches_parallel;
pub use progress::RunSummary;
pub use run::{BatchReport, BatchRunner, BatchStatus};
