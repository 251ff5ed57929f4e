//! Proxy selection for outgoing requests.
//!
//! The submission engine only sees [`ProxySelector::pick`]; where proxies come
//! from and how they rotate stays behind the trait.

mod list;

pub use list::{parse_proxy_line, ProxyList, SUPPORTED_SCHEMES};

/// Supplies an optional proxy URI for each attempt.
pub trait ProxySelector: Send + Sync {
    /// Proxy to use for the next attempt, or `None` for a direct connection.
    fn pick(&self) -> Option<String>;
}

/// Always connects directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

impl ProxySelector for NoProxy {
    fn pick(&self) -> Option<String> {
        None
    }
}

/// Always uses the same proxy.
#[derive(Debug, Clone)]
pub struct FixedProxy(pub String);

impl ProxySelector for FixedProxy {
    fn pick(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
