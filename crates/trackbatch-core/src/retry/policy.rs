use rand::Rng;
use std::time::Duration;

use super::error::FailureKind;
use crate::config::RetryConfig;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up on this batch.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Attempt bookkeeping for one batch. Owned by the orchestrator and dropped
/// when the batch finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Failed attempts so far.
    pub attempt_count: u32,
    /// Failed attempts classified as [`FailureKind::Unexpected`].
    pub unexpected_count: u32,
    pub last_failure: Option<FailureKind>,
}

impl RetryState {
    pub fn record(&mut self, kind: FailureKind) {
        self.attempt_count += 1;
        if kind == FailureKind::Unexpected {
            self.unexpected_count += 1;
        }
        self.last_failure = Some(kind);
    }
}

/// Exponential backoff with jitter, a cap, and per-kind adjustments.
///
/// `delay(k, n) = min((base * 2^n + jitter) * m(k), cap)` where `jitter` is
/// uniform over `[0, jitter_fraction * base * 2^n]` and `m(k)` is
/// `rate_limit_multiplier` for [`FailureKind::RateLimited`], 1 otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Failed attempts after which the batch is given up.
    pub max_attempts: u32,
    /// Tighter budget for [`FailureKind::Unexpected`] failures.
    pub max_unexpected_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// Jitter as a fraction of the exponential delay, in `[0, 1]`.
    pub jitter_fraction: f64,
    /// Delay multiplier for throttled batches.
    pub rate_limit_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    /// Out-of-range base delays (rejected by `TrackbatchConfig::validate`)
    /// fall back to the cap.
    fn from(cfg: &RetryConfig) -> Self {
        let max_delay = Duration::from_secs(cfg.max_delay_secs);
        Self {
            max_attempts: cfg.max_attempts,
            max_unexpected_attempts: cfg.max_unexpected_attempts,
            base_delay: Duration::try_from_secs_f64(cfg.base_delay_secs)
                .unwrap_or(max_delay),
            max_delay,
            jitter_fraction: cfg.jitter_fraction,
            rate_limit_multiplier: cfg.rate_limit_multiplier,
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after `state` recorded a failure of `kind`.
    pub fn decide(&self, state: &RetryState, kind: FailureKind) -> RetryDecision {
        if state.attempt_count >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        if kind == FailureKind::Unexpected
            && state.unexpected_count >= self.max_unexpected_attempts
        {
            return RetryDecision::NoRetry;
        }
        let unit = rand::thread_rng().gen_range(0.0..=1.0);
        RetryDecision::RetryAfter(self.delay(kind, state.attempt_count, unit))
    }

    /// Backoff delay for the `attempt`-th failure with a jitter draw `unit`
    /// in `[0, 1]`.
    pub fn delay(&self, kind: FailureKind, attempt: u32, unit: f64) -> Duration {
        let cap = self.max_delay.as_secs_f64();
        // 2^62 seconds is far past any cap; keeps the float finite.
        let exp = 2f64.powi(attempt.min(62) as i32);
        let raw = self.base_delay.as_secs_f64() * exp;
        let jitter = raw * self.jitter_fraction * unit.clamp(0.0, 1.0);
        let multiplier = match kind {
            FailureKind::RateLimited => self.rate_limit_multiplier,
            _ => 1.0,
        };
        let secs = ((raw + jitter) * multiplier).min(cap);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}
