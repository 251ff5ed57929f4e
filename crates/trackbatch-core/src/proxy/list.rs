//! File-backed proxy list with random rotation.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::path::Path;
use url::Url;

use super::ProxySelector;

/// Proxy schemes libcurl is asked to handle.
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "socks4", "socks5", "socks5h"];

/// Validated proxy URIs; [`ProxySelector::pick`] returns one at random.
#[derive(Debug, Clone)]
pub struct ProxyList {
    proxies: Vec<String>,
}

impl ProxyList {
    /// Builds a list from already validated URIs. Returns `None` if empty.
    pub fn new(proxies: Vec<String>) -> Option<Self> {
        if proxies.is_empty() {
            None
        } else {
            Some(Self { proxies })
        }
    }

    /// Parses proxy file contents. Blank lines and `#` comments are skipped;
    /// malformed lines are logged and dropped.
    pub fn parse(text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_proxy_line(line) {
                Ok(uri) => out.push(uri),
                Err(reason) => {
                    tracing::warn!(line = idx + 1, "skipping proxy entry: {}", reason);
                }
            }
        }
        out
    }

    /// Loads a proxy file. Fails if the file cannot be read or has no usable entry.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read proxy file: {}", path.display()))?;
        let proxies = Self::parse(&text);
        tracing::info!(count = proxies.len(), "loaded proxies from {}", path.display());
        Self::new(proxies)
            .ok_or_else(|| anyhow::anyhow!("no usable proxies in {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl ProxySelector for ProxyList {
    fn pick(&self) -> Option<String> {
        self.proxies.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Validates one `scheme://[user:pass@]host:port` entry.
pub fn parse_proxy_line(line: &str) -> std::result::Result<String, String> {
    let url = Url::parse(line).map_err(|e| format!("invalid URI {:?}: {}", line, e))?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(format!("unsupported proxy scheme {:?}", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("proxy {:?} has no host", line));
    }
    // `Url::port` hides the scheme's default port, so check the raw authority too.
    let authority = line
        .split_once("://")
        .map(|(_, rest)| rest.split('/').next().unwrap_or(rest))
        .unwrap_or("");
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let has_port = host_port
        .rsplit_once(':')
        .map_or(false, |(_, p)| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !has_port {
        return Err(format!("proxy {:?} has no port", line));
    }
    Ok(line.to_string())
}
