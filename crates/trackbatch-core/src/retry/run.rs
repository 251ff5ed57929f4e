//! Retry loop: drive one batch's attempts until success, exhaustion, or a
//! fatal error.

use std::future::Future;
use std::time::Duration;

use super::error::{AttemptOutcome, FailureKind, FatalReason};
use super::policy::{RetryDecision, RetryPolicy, RetryState};
use crate::control::RunControl;

/// Suspends a batch task between attempts.
pub trait Sleep: Send + Sync {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

impl Sleep for TokioSleep {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}

/// Why a batch was given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiveUpReason {
    /// Retry budget spent; carries the kind of the last failure.
    Exhausted(FailureKind),
    /// Non-retryable failure on the given attempt.
    Fatal(FatalReason),
}

/// Terminal state of one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Succeeded { result: T, attempts: u32 },
    GaveUp { reason: GiveUpReason, state: RetryState },
    /// Run cancelled; nothing should be persisted for this batch.
    Aborted { state: RetryState },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }
}

/// Runs attempts sequentially, sleeping between retryable failures.
#[derive(Debug, Clone)]
pub struct RetryOrchestrator<S = TokioSleep> {
    policy: RetryPolicy,
    sleeper: S,
    control: RunControl,
}

impl RetryOrchestrator<TokioSleep> {
    pub fn new(policy: RetryPolicy, control: RunControl) -> Self {
        Self::with_sleeper(policy, control, TokioSleep)
    }
}

impl<S: Sleep> RetryOrchestrator<S> {
    pub fn with_sleeper(policy: RetryPolicy, control: RunControl, sleeper: S) -> Self {
        Self {
            policy,
            sleeper,
            control,
        }
    }

    /// Calls `attempt` (with the 1-based attempt number) until it succeeds or
    /// the policy gives up. `label` identifies the batch in logs.
    pub async fn run<T, F, Fut>(&self, label: &str, mut attempt: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let mut state = RetryState::default();
        loop {
            if self.control.is_cancelled() {
                return RetryOutcome::Aborted { state };
            }
            let number = state.attempt_count + 1;
            match attempt(number).await {
                AttemptOutcome::Success(result) => {
                    if state.attempt_count > 0 {
                        tracing::info!(batch = label, attempts = number, "batch succeeded after retry");
                    }
                    return RetryOutcome::Succeeded {
                        result,
                        attempts: number,
                    };
                }
                AttemptOutcome::Fatal(reason) => {
                    tracing::error!(batch = label, attempt = number, "fatal: {}", reason);
                    return RetryOutcome::GaveUp {
                        reason: GiveUpReason::Fatal(reason),
                        state,
                    };
                }
                AttemptOutcome::Aborted => return RetryOutcome::Aborted { state },
                AttemptOutcome::Retryable { kind, detail } => {
                    state.record(kind);
                    match self.policy.decide(&state, kind) {
                        RetryDecision::NoRetry => {
                            tracing::error!(
                                batch = label,
                                attempts = state.attempt_count,
                                kind = %kind,
                                "giving up: {}",
                                detail
                            );
                            return RetryOutcome::GaveUp {
                                reason: GiveUpReason::Exhausted(kind),
                                state,
                            };
                        }
                        RetryDecision::RetryAfter(delay) => {
                            tracing::warn!(
                                batch = label,
                                attempt = state.attempt_count,
                                max_attempts = self.policy.max_attempts,
                                kind = %kind,
                                delay_ms = delay.as_millis() as u64,
                                "attempt failed, retrying: {}",
                                detail
                            );
                            tokio::select! {
                                _ = self.sleeper.sleep(delay) => {}
                                _ = self.control.cancelled() => {
                                    return RetryOutcome::Aborted { state };
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Records requested delays and returns immediately.
    #[derive(Default, Clone)]
    struct RecordingSleep {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    impl Sleep for RecordingSleep {
        fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
            self.delays.lock().unwrap().push(delay);
            std::future::ready(())
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 10,
            max_unexpected_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_fraction: 0.5,
            rate_limit_multiplier: 2.0,
        }
    }

    fn scripted(
        outcomes: Vec<AttemptOutcome<&'static str>>,
    ) -> (
        Arc<Mutex<VecDeque<AttemptOutcome<&'static str>>>>,
        Arc<Mutex<u32>>,
    ) {
        (
            Arc::new(Mutex::new(outcomes.into_iter().collect())),
            Arc::new(Mutex::new(0)),
        )
    }

    async fn drive(
        orch: &RetryOrchestrator<RecordingSleep>,
        outcomes: Vec<AttemptOutcome<&'static str>>,
    ) -> (RetryOutcome<&'static str>, u32) {
        let (queue, calls) = scripted(outcomes);
        let out = orch
            .run("test", |_| {
                let queue = Arc::clone(&queue);
                let calls = Arc::clone(&calls);
                async move {
                    *calls.lock().unwrap() += 1;
                    queue
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or(AttemptOutcome::retryable(FailureKind::Connection, "refused"))
                }
            })
            .await;
        let n = *calls.lock().unwrap();
        (out, n)
    }

    #[tokio::test]
    async fn n_failures_then_success() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep.clone());
        let mut script: Vec<_> = (0..7)
            .map(|_| AttemptOutcome::retryable(FailureKind::Connection, "refused"))
            .collect();
        script.push(AttemptOutcome::Success("done"));

        let (out, calls) = drive(&orch, script).await;
        assert_eq!(
            out,
            RetryOutcome::Succeeded {
                result: "done",
                attempts: 8
            }
        );
        assert_eq!(calls, 8);

        let delays = sleep.delays.lock().unwrap().clone();
        assert_eq!(delays.len(), 7);
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "delays must not decrease: {:?}", delays);
        }
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(30)));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn success_first_try_never_sleeps() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep.clone());
        let (out, calls) = drive(&orch, vec![AttemptOutcome::Success("ok")]).await;
        assert!(out.is_success());
        assert_eq!(calls, 1);
        assert!(sleep.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_attempts_gives_up() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep.clone());
        let (out, calls) = drive(&orch, Vec::new()).await;
        match out {
            RetryOutcome::GaveUp { reason, state } => {
                assert_eq!(reason, GiveUpReason::Exhausted(FailureKind::Connection));
                assert_eq!(state.attempt_count, 10);
            }
            other => panic!("expected GaveUp, got {:?}", other),
        }
        assert_eq!(calls, 10);
        assert_eq!(sleep.delays.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn unexpected_capped() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep);
        let script = (0..10)
            .map(|_| AttemptOutcome::retryable(FailureKind::Unexpected, "bad json"))
            .collect();
        let (out, calls) = drive(&orch, script).await;
        assert!(matches!(
            out,
            RetryOutcome::GaveUp {
                reason: GiveUpReason::Exhausted(FailureKind::Unexpected),
                ..
            }
        ));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn fatal_stops_immediately() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep.clone());
        let fatal = FatalReason::OversizedBatch { size: 41, max: 40 };
        let (out, calls) = drive(&orch, vec![AttemptOutcome::Fatal(fatal.clone())]).await;
        assert!(matches!(
            out,
            RetryOutcome::GaveUp { reason: GiveUpReason::Fatal(ref r), .. } if *r == fatal
        ));
        assert_eq!(calls, 1);
        assert!(sleep.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_retries_then_succeeds() {
        let sleep = RecordingSleep::default();
        let orch = RetryOrchestrator::with_sleeper(policy(), RunControl::new(), sleep.clone());
        let script = vec![
            AttemptOutcome::retryable(FailureKind::RateLimited, "sentinel"),
            AttemptOutcome::Success("ok"),
        ];
        let (out, calls) = drive(&orch, script).await;
        assert_eq!(
            out,
            RetryOutcome::Succeeded {
                result: "ok",
                attempts: 2
            }
        );
        assert_eq!(calls, 2);
        let delays = sleep.delays.lock().unwrap().clone();
        // base 1s * 2^1 * 2 (throttled), plus up to 50% jitter before doubling.
        assert!(delays[0] >= Duration::from_secs(4) && delays[0] <= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let control = RunControl::new();
        control.cancel();
        let orch = RetryOrchestrator::with_sleeper(policy(), control, RecordingSleep::default());
        let (out, calls) = drive(&orch, vec![AttemptOutcome::Success("ok")]).await;
        assert!(matches!(out, RetryOutcome::Aborted { .. }));
        assert_eq!(calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_backoff_sleep() {
        let control = RunControl::new();
        let orch = RetryOrchestrator::new(policy(), control.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            control.cancel();
        });
        let out: RetryOutcome<()> = orch
            .run("test", |_| async {
                AttemptOutcome::retryable(FailureKind::Timeout, "slow")
            })
            .await;
        canceller.await.unwrap();
        match out {
            RetryOutcome::Aborted { state } => assert_eq!(state.attempt_count, 1),
            other => panic!("expected Aborted, got {:?}", other),
        }
    }
}
