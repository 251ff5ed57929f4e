//! Run one batch: retry until done, then persist the outcome.

use crate::batch::Batch;
use crate::control::RunControl;
use crate::fingerprint::{EntropySource, SystemEntropy};
use crate::retry::{GiveUpReason, RetryOrchestrator, RetryOutcome, Sleep, TokioSleep};
use crate::storage::ResultStore;
use crate::tracking::BatchClient;
use crate::transport::Transport;

/// Terminal status of one batch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Succeeded { attempts: u32 },
    /// Written to the fallback file.
    GaveUp,
    /// Cancelled; nothing was persisted.
    Aborted,
}

/// What one batch task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub index: usize,
    pub size: usize,
    pub status: BatchStatus,
    pub resolved: usize,
    pub partial: usize,
    pub unresolved: usize,
}

/// Everything a batch task needs, shared by all tasks of a run.
pub struct BatchRunner<T, E = SystemEntropy, S = TokioSleep> {
    client: BatchClient<T, E>,
    orchestrator: RetryOrchestrator<S>,
    store: ResultStore,
    control: RunControl,
}

impl<T, E, S> BatchRunner<T, E, S>
where
    T: Transport,
    E: EntropySource,
    S: Sleep,
{
    pub fn new(
        client: BatchClient<T, E>,
        orchestrator: RetryOrchestrator<S>,
        store: ResultStore,
        control: RunControl,
    ) -> Self {
        Self {
            client,
            orchestrator,
            store,
            control,
        }
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// Drives `batch` to a terminal state and persists it. Never fails:
    /// storage errors are logged and the report still reflects the outcome.
    pub async fn process(&self, index: usize, batch: &Batch) -> BatchReport {
        let label = format!("#{}", index);
        let mut report = BatchReport {
            index,
            size: batch.len(),
            status: BatchStatus::Aborted,
            resolved: 0,
            partial: 0,
            unresolved: 0,
        };

        let outcome = self
            .orchestrator
            .run(&label, |_| self.client.submit(batch))
            .await;

        match outcome {
            RetryOutcome::Succeeded { result, attempts } => {
                tracing::info!(
                    batch = %label,
                    attempts,
                    "{} | {} | {}",
                    result.resolved.len(),
                    result.partial.len(),
                    result.unresolved.len()
                );
                if let Err(e) = self.store.append_classified(&result).await {
                    tracing::error!(batch = %label, "failed to write results: {:#}", e);
                }
                report.status = BatchStatus::Succeeded { attempts };
                report.resolved = result.resolved.len();
                report.partial = result.partial.len();
                report.unresolved = result.unresolved.len();
            }
            RetryOutcome::GaveUp { reason, state } => {
                let why = match reason {
                    GiveUpReason::Exhausted(kind) => kind.to_string(),
                    GiveUpReason::Fatal(fatal) => fatal.to_string(),
                };
                tracing::error!(
                    batch = %label,
                    numbers = batch.len(),
                    attempts = state.attempt_count,
                    "batch given up ({}), writing to unchecked",
                    why
                );
                if let Err(e) = self.store.append_unchecked(batch).await {
                    tracing::error!(batch = %label, "failed to write unchecked batch: {:#}", e);
                }
                report.status = BatchStatus::GaveUp;
            }
            RetryOutcome::Aborted { state } => {
                tracing::info!(
                    batch = %label,
                    attempts = state.attempt_count,
                    "batch cancelled"
                );
            }
        }
        report
    }
}
