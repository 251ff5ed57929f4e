//! HTTP transport for batch requests.
//!
//! [`Transport`] is the seam between the batch client and the network. The
//! production implementation drives libcurl on tokio's blocking pool with
//! handles borrowed from a shared [`EasyPool`].

mod curl;
mod pool;

pub use self::curl::{CurlSettings, CurlTransport};
pub use self::pool::{EasyPool, PoolSettings, PooledEasy};

use std::future::Future;

use crate::control::RunControl;
use crate::retry::FailureKind;

/// One POST request, fully prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub url: String,
    /// Header name/value pairs, sent in order.
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Proxy URI, or `None` for a direct connection.
    pub proxy: Option<String>,
}

/// Status and (decoded) body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Transport-level failure, already classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The run was cancelled during the exchange.
    #[error("transfer aborted")]
    Aborted,
    #[error("{kind}: {message}")]
    Failed { kind: FailureKind, message: String },
}

impl TransportError {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        TransportError::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Performs one HTTP exchange.
///
/// Implementations must release every per-request resource on all exit paths
/// and return [`TransportError::Aborted`] promptly once `control` is cancelled.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        request: TrackRequest,
        control: &RunControl,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
