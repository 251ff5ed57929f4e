//! libcurl-backed transport.
//!
//! Each exchange borrows a pooled easy handle and runs on the blocking pool.
//! Cancellation is checked from curl's progress callback.

use std::sync::Arc;
use std::time::Duration;

use curl::easy::{Easy, List};
use url::Url;

use super::pool::EasyPool;
use super::{TrackRequest, Transport, TransportError, TransportResponse};
use crate::config::TrackbatchConfig;
use crate::control::RunControl;
use crate::retry::{classify_curl_error, FailureKind};

/// Per-request curl options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlSettings {
    /// Hard limit for the whole exchange.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Verify the server certificate and host name.
    pub verify_tls: bool,
}

impl Default for CurlSettings {
    fn default() -> Self {
        Self::from(&TrackbatchConfig::default())
    }
}

impl From<&TrackbatchConfig> for CurlSettings {
    fn from(cfg: &TrackbatchConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            verify_tls: cfg.verify_tls,
        }
    }
}

/// Transport that performs each POST with libcurl.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    pool: Arc<EasyPool>,
    settings: CurlSettings,
}

impl CurlTransport {
    pub fn new(pool: Arc<EasyPool>, settings: CurlSettings) -> Self {
        Self { pool, settings }
    }

    pub fn pool(&self) -> &Arc<EasyPool> {
        &self.pool
    }
}

impl Transport for CurlTransport {
    async fn post(
        &self,
        request: TrackRequest,
        control: &RunControl,
    ) -> Result<TransportResponse, TransportError> {
        let target = target_key(&request);
        let mut handle = tokio::select! {
            h = self.pool.acquire(&target) => h.ok_or_else(|| {
                TransportError::failed(FailureKind::Unexpected, "connection pool closed")
            })?,
            _ = control.cancelled() => return Err(TransportError::Aborted),
        };
        let settings = self.settings;
        let control = control.clone();
        let max_connects = self.pool.settings().max_connections_per_handle;

        tokio::task::spawn_blocking(move || {
            let result = perform(handle.easy(), &request, settings, max_connects, &control);
            if result.is_err() {
                handle.discard();
            }
            result
        })
        .await
        .map_err(|e| TransportError::failed(FailureKind::Unexpected, format!("transfer task join: {}", e)))?
    }
}

/// Peer a transfer actually connects to: the proxy if one is set, else the
/// endpoint's host and port.
fn target_key(request: &TrackRequest) -> String {
    if let Some(proxy) = &request.proxy {
        return proxy.clone();
    }
    match Url::parse(&request.url) {
        Ok(url) => format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or(0)
        ),
        Err(_) => request.url.clone(),
    }
}

fn setup_error(e: curl::Error) -> TransportError {
    TransportError::failed(FailureKind::Unexpected, format!("curl setup: {}", e))
}

/// Runs one POST on `easy`. Blocks the current thread.
fn perform(
    easy: &mut Easy,
    request: &TrackRequest,
    settings: CurlSettings,
    max_connects: u32,
    control: &RunControl,
) -> Result<TransportResponse, TransportError> {
    // Clears options from the previous request; live connections survive.
    easy.reset();
    easy.url(&request.url).map_err(setup_error)?;
    easy.post(true).map_err(setup_error)?;
    easy.post_fields_copy(request.body.as_bytes())
        .map_err(setup_error)?;
    // Empty string: advertise and decode every encoding libcurl supports.
    easy.accept_encoding("").map_err(setup_error)?;
    easy.connect_timeout(settings.connect_timeout)
        .map_err(setup_error)?;
    easy.timeout(settings.request_timeout).map_err(setup_error)?;
    easy.ssl_verify_peer(settings.verify_tls)
        .map_err(setup_error)?;
    easy.ssl_verify_host(settings.verify_tls)
        .map_err(setup_error)?;
    easy.max_connects(max_connects).map_err(setup_error)?;
    easy.tcp_keepalive(true).map_err(setup_error)?;
    easy.progress(true).map_err(setup_error)?;
    if let Some(proxy) = &request.proxy {
        easy.proxy(proxy).map_err(setup_error)?;
    }

    let mut list = List::new();
    for (name, value) in &request.headers {
        list.append(&format!("{}: {}", name.trim(), value.trim()))
            .map_err(setup_error)?;
    }
    easy.http_headers(list).map_err(setup_error)?;

    let mut body = Vec::new();
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(setup_error)?;
        transfer
            .progress_function(|_, _, _, _| !control.is_cancelled())
            .map_err(setup_error)?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if e.is_aborted_by_callback() && control.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        let kind = classify_curl_error(&e, request.proxy.is_some());
        return Err(TransportError::failed(kind, e.to_string()));
    }

    let status = easy.response_code().map_err(|e| {
        TransportError::failed(FailureKind::Unexpected, format!("no response code: {}", e))
    })?;
    Ok(TransportResponse { status, body })
}
