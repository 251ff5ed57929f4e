//! Failure taxonomy and per-attempt outcome.

use std::fmt;

/// Why one attempt failed in a way that may succeed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Proxy refused, unreachable, or failed the CONNECT tunnel.
    Proxy,
    /// TLS handshake or certificate failure.
    Tls,
    /// TCP connect or DNS failure on a direct connection.
    Connection,
    /// Peer closed the connection or sent nothing back.
    ServerDisconnected,
    /// Connect or total request timeout.
    Timeout,
    /// Response status other than 200.
    HttpStatus(u16),
    /// 200 response carrying a soft-block sentinel.
    RateLimited,
    /// Anything else (malformed payload, transport setup error, ...).
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Proxy => write!(f, "proxy failure"),
            FailureKind::Tls => write!(f, "TLS failure"),
            FailureKind::Connection => write!(f, "connection failure"),
            FailureKind::ServerDisconnected => write!(f, "server disconnected"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Failure that must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalReason {
    /// Batch exceeds the upstream cap; rejected locally, nothing was sent.
    #[error("batch of {size} exceeds the {max}-number limit")]
    OversizedBatch { size: usize, max: usize },
}

/// Result of one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    Success(T),
    Retryable { kind: FailureKind, detail: String },
    Fatal(FatalReason),
    /// The run was cancelled while the exchange was in flight.
    Aborted,
}

impl<T> AttemptOutcome<T> {
    pub fn retryable(kind: FailureKind, detail: impl Into<String>) -> Self {
        AttemptOutcome::Retryable {
            kind,
            detail: detail.into(),
        }
    }
}
