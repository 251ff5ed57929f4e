//! Run all batches of a run concurrently.
//!
//! Keeps up to `max_concurrent` batch tasks in flight; when one finishes, the
//! next planned batch is started until the queue is empty or the run is
//! cancelled.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::batch::Batch;
use crate::fingerprint::EntropySource;
use crate::retry::Sleep;
use crate::transport::Transport;

use super::progress::RunSummary;
use super::run::{BatchReport, BatchRunner, BatchStatus};

/// Runs `batches` with up to `max_concurrent` in flight at once and returns
/// the final counters. A snapshot is sent to `progress_tx` after every batch.
///
/// Batches still queued when the run is cancelled are never started and are
/// counted as aborted.
pub async fn run_batches_parallel<T, E, S>(
    runner: Arc<BatchRunner<T, E, S>>,
    batches: Vec<Batch>,
    max_concurrent: usize,
    progress_tx: Option<tokio::sync::mpsc::Sender<RunSummary>>,
) -> RunSummary
where
    T: Transport + 'static,
    E: EntropySource + 'static,
    S: Sleep + 'static,
{
    let max_concurrent = max_concurrent.max(1);
    let mut summary = RunSummary::new(batches.len());
    let mut queue: VecDeque<(usize, Batch)> = batches.into_iter().enumerate().collect();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_concurrent && !runner.control().is_cancelled() {
            let Some((index, batch)) = queue.pop_front() else {
                break;
            };
            let runner = Arc::clone(&runner);
            join_set.spawn(async move { runner.process(index, &batch).await });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(report) => summary.record(&report),
            Err(e) => {
                tracing::error!("batch task join: {}", e);
                summary.batches_aborted += 1;
            }
        }
        if let Some(tx) = &progress_tx {
            let _ = tx.send(summary.clone()).await;
        }
    }

    for (index, batch) in queue {
        summary.record(&BatchReport {
            index,
            size: batch.len(),
            status: BatchStatus::Aborted,
            resolved: 0,
            partial: 0,
            unresolved: 0,
        });
    }

    tracing::info!(
        batches = summary.batches_total,
        succeeded = summary.batches_succeeded,
        given_up = summary.batches_given_up,
        aborted = summary.batches_aborted,
        "run finished: {} | {} | {} | unchecked {}",
        summary.resolved,
        summary.partial,
        summary.unresolved,
        summary.unchecked
    );
    summary
}
