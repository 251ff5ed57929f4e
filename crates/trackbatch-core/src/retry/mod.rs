//! Retry and backoff policy.
//!
//! Classifies transport failures into kinds, computes per-kind exponential
//! backoff, and runs one batch's attempts until it succeeds or is given up.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status};
pub use error::{AttemptOutcome, FailureKind, FatalReason};
pub use policy::{RetryDecision, RetryPolicy, RetryState};
pub use run::{GiveUpReason, RetryOrchestrator, RetryOutcome, Sleep, TokioSleep};
