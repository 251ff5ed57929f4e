//! Single-attempt batch submission.

use std::sync::Arc;

use serde_json::Value;

use super::request::{BatchRequestBody, RequestProfile};
use super::response::{classify, ClassifiedResult, Verdict};
use crate::batch::{Batch, MAX_BATCH_SIZE};
use crate::control::RunControl;
use crate::fingerprint::{EntropySource, FingerprintGenerator, SystemEntropy};
use crate::proxy::ProxySelector;
use crate::retry::{classify_http_status, AttemptOutcome, FailureKind, FatalReason};
use crate::transport::{TrackRequest, Transport, TransportError};

/// Submits a batch in one HTTP exchange and classifies the reply.
///
/// Holds no per-attempt state; a fresh fingerprint is generated for every
/// call, so one client can serve many concurrent batch tasks.
pub struct BatchClient<T, E = SystemEntropy> {
    transport: T,
    proxies: Arc<dyn ProxySelector>,
    fingerprints: FingerprintGenerator<E>,
    profile: RequestProfile,
    control: RunControl,
}

impl<T: Transport> BatchClient<T, SystemEntropy> {
    pub fn new(
        transport: T,
        profile: RequestProfile,
        proxies: Arc<dyn ProxySelector>,
        control: RunControl,
    ) -> Self {
        Self::with_fingerprints(
            transport,
            profile,
            proxies,
            control,
            FingerprintGenerator::system(),
        )
    }
}

impl<T: Transport, E: EntropySource> BatchClient<T, E> {
    pub fn with_fingerprints(
        transport: T,
        profile: RequestProfile,
        proxies: Arc<dyn ProxySelector>,
        control: RunControl,
        fingerprints: FingerprintGenerator<E>,
    ) -> Self {
        Self {
            transport,
            proxies,
            fingerprints,
            profile,
            control,
        }
    }

    /// One attempt through a proxy chosen by the injected selector.
    pub async fn submit(&self, batch: &Batch) -> AttemptOutcome<ClassifiedResult> {
        let proxy = self.proxies.pick();
        self.attempt(batch, proxy).await
    }

    /// One attempt through `proxy` (`None` = direct).
    pub async fn attempt(
        &self,
        batch: &Batch,
        proxy: Option<String>,
    ) -> AttemptOutcome<ClassifiedResult> {
        if batch.len() > MAX_BATCH_SIZE {
            return AttemptOutcome::Fatal(FatalReason::OversizedBatch {
                size: batch.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let payload = BatchRequestBody::new(batch, self.fingerprints.utc_offset_minutes());
        let (fingerprint, body) = match self.fingerprints.generate_for(&payload) {
            Ok(v) => v,
            Err(e) => {
                return AttemptOutcome::retryable(
                    FailureKind::Unexpected,
                    format!("failed to encode request body: {}", e),
                )
            }
        };

        let request = TrackRequest {
            url: self.profile.url.clone(),
            headers: self.profile.headers(&fingerprint),
            body,
            proxy,
        };
        tracing::debug!(
            numbers = batch.len(),
            proxy = request.proxy.as_deref().unwrap_or("direct"),
            guid = %fingerprint.guid,
            "posting batch"
        );

        let response = match self.transport.post(request, &self.control).await {
            Ok(r) => r,
            Err(TransportError::Aborted) => return AttemptOutcome::Aborted,
            Err(TransportError::Failed { kind, message }) => {
                return AttemptOutcome::retryable(kind, message)
            }
        };

        if response.status != 200 {
            return AttemptOutcome::retryable(
                classify_http_status(response.status),
                format!("endpoint returned HTTP {}", response.status),
            );
        }

        let json: Value = match serde_json::from_slice(&response.body) {
            Ok(v) => v,
            Err(e) => {
                return AttemptOutcome::retryable(
                    FailureKind::Unexpected,
                    format!("invalid JSON in response: {}", e),
                )
            }
        };

        match classify(&json, batch) {
            Ok(Verdict::Classified(result)) => AttemptOutcome::Success(result),
            Ok(Verdict::RateLimited) => AttemptOutcome::retryable(
                FailureKind::RateLimited,
                "response carries a rate-limit sentinel",
            ),
            Err(e) => AttemptOutcome::retryable(FailureKind::Unexpected, e.to_string()),
        }
    }
}
