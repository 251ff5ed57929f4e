//! Classify HTTP status and curl errors into failure kinds.

use super::error::FailureKind;

/// `CURLE_PROXY` (libcurl >= 7.73); older versions report a connect error.
const CURLE_PROXY: i32 = 97;

/// Any status other than 200 is a retryable HTTP failure.
pub fn classify_http_status(code: u32) -> FailureKind {
    FailureKind::HttpStatus(u16::try_from(code).unwrap_or(u16::MAX))
}

/// Classify a curl error. `via_proxy` tells whether the transfer went through
/// a proxy; connect failures are then attributed to the proxy.
pub fn classify_curl_error(e: &curl::Error, via_proxy: bool) -> FailureKind {
    if e.is_couldnt_resolve_proxy() || e.code() as i32 == CURLE_PROXY {
        return FailureKind::Proxy;
    }
    if via_proxy && e.is_couldnt_connect() {
        return FailureKind::Proxy;
    }
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_ssl_certproblem()
        || e.is_ssl_cacert()
        || e.is_ssl_cipher()
    {
        return FailureKind::Tls;
    }
    if e.is_got_nothing()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_partial_file()
        || e.is_http2_error()
    {
        return FailureKind::ServerDisconnected;
    }
    if e.is_couldnt_connect() || e.is_couldnt_resolve_host() {
        return FailureKind::Connection;
    }
    FailureKind::Unexpected
}
