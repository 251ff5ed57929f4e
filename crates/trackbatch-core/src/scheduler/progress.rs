//! Run-level progress counters.

use super::run::{BatchReport, BatchStatus};

/// Snapshot of run progress (CLI-friendly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Batches planned for this run.
    pub batches_total: usize,
    pub batches_succeeded: usize,
    pub batches_given_up: usize,
    /// Batches cancelled in flight or never started.
    pub batches_aborted: usize,
    pub resolved: usize,
    pub partial: usize,
    pub unresolved: usize,
    /// Numbers written to the fallback file.
    pub unchecked: usize,
}

impl RunSummary {
    pub fn new(batches_total: usize) -> Self {
        Self {
            batches_total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &BatchReport) {
        match report.status {
            BatchStatus::Succeeded { .. } => {
                self.batches_succeeded += 1;
                self.resolved += report.resolved;
                self.partial += report.partial;
                self.unresolved += report.unresolved;
            }
            BatchStatus::GaveUp => {
                self.batches_given_up += 1;
                self.unchecked += report.size;
            }
            BatchStatus::Aborted => self.batches_aborted += 1,
        }
    }

    pub fn batches_done(&self) -> usize {
        self.batches_succeeded + self.batches_given_up + self.batches_aborted
    }

    /// Fraction of batches finished, in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.batches_total == 0 {
            return 1.0;
        }
        (self.batches_done() as f64 / self.batches_total as f64).min(1.0)
    }
}
