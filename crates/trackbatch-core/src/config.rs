use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::MAX_BATCH_SIZE;

/// Upper bound for `retry.max_delay_secs`.
pub const MAX_RETRY_DELAY_SECS: u64 = 3600;

/// Default tracking endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://t.17track.net/track/restapi";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per batch (including the first).
    pub max_attempts: u32,
    /// Tighter attempt cap for unclassified failures.
    pub max_unexpected_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Jitter as a fraction of the exponential delay, in [0, 1].
    pub jitter_fraction: f64,
    /// Extra delay factor applied to rate-limited attempts.
    pub rate_limit_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            max_unexpected_attempts: 5,
            base_delay_secs: 1.0,
            max_delay_secs: 60,
            jitter_fraction: 0.25,
            rate_limit_multiplier: 2.0,
        }
    }
}

/// Shared curl handle pool (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum easy handles alive at once across all batches.
    pub max_handles: usize,
    /// Concurrent transfers to one proxy, or to the endpoint when direct.
    pub max_connections_per_target: usize,
    /// Cached connections per handle.
    pub max_connections_per_handle: u32,
    /// Idle handles older than this are closed instead of reused.
    pub idle_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_handles: 100,
            max_connections_per_target: 10,
            max_connections_per_handle: 10,
            idle_timeout_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/trackbatch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackbatchConfig {
    /// Tracking endpoint URL.
    pub endpoint: String,
    /// Track numbers per request (at most 40).
    pub batch_size: usize,
    /// Batches in flight at once.
    pub max_concurrent_batches: usize,
    /// Total timeout for one request, in seconds.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Verify server certificates. Off by default; the endpoint is usually
    /// reached through proxies that re-sign traffic.
    #[serde(default)]
    pub verify_tls: bool,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional pool limits; if missing, built-in defaults are used.
    #[serde(default)]
    pub pool: Option<PoolConfig>,
}

impl Default for TrackbatchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: MAX_BATCH_SIZE,
            max_concurrent_batches: 25,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            verify_tls: false,
            retry: None,
            pool: None,
        }
    }
}

impl TrackbatchConfig {
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn pool_config(&self) -> PoolConfig {
        self.pool.clone().unwrap_or_default()
    }

    /// Pretty TOML, as written by `load_or_init`.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the run cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            anyhow::bail!(
                "batch_size must be between 1 and {} (got {})",
                MAX_BATCH_SIZE,
                self.batch_size
            );
        }
        if self.max_concurrent_batches == 0 {
            anyhow::bail!("max_concurrent_batches must be at least 1");
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            anyhow::bail!("request and connect timeouts must be non-zero");
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            anyhow::bail!("endpoint must be an http(s) URL: {}", self.endpoint);
        }

        let retry = self.retry_config();
        if retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if retry.max_unexpected_attempts == 0 {
            anyhow::bail!("retry.max_unexpected_attempts must be at least 1");
        }
        if retry.max_delay_secs == 0 || retry.max_delay_secs > MAX_RETRY_DELAY_SECS {
            anyhow::bail!(
                "retry.max_delay_secs must be between 1 and {} (got {})",
                MAX_RETRY_DELAY_SECS,
                retry.max_delay_secs
            );
        }
        if !retry.base_delay_secs.is_finite()
            || retry.base_delay_secs < 0.0
            || retry.base_delay_secs > retry.max_delay_secs as f64
        {
            anyhow::bail!(
                "retry.base_delay_secs must be between 0 and max_delay_secs ({})",
                retry.max_delay_secs
            );
        }
        if !(0.0..=1.0).contains(&retry.jitter_fraction) {
            anyhow::bail!("retry.jitter_fraction must be within [0, 1]");
        }
        if !retry.rate_limit_multiplier.is_finite() || retry.rate_limit_multiplier < 1.0 {
            anyhow::bail!("retry.rate_limit_multiplier must be at least 1");
        }

        let pool = self.pool_config();
        if pool.max_handles == 0
            || pool.max_connections_per_target == 0
            || pool.max_connections_per_handle == 0
        {
            anyhow::bail!("pool limits must be non-zero");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("trackbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TrackbatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TrackbatchConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<TrackbatchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: TrackbatchConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = TrackbatchConfig::default();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.batch_size, 40);
        assert_eq!(cfg.max_concurrent_batches, 25);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert!(!cfg.verify_tls);
        assert!(cfg.validate().is_ok());

        let retry = cfg.retry_config();
        assert_eq!(retry.max_attempts, 100);
        assert_eq!(retry.max_unexpected_attempts, 5);
        assert_eq!(retry.max_delay_secs, 60);
        assert_eq!(cfg.pool_config().max_handles, 100);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = TrackbatchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TrackbatchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            endpoint = "http://127.0.0.1:9000/track/restapi"
            batch_size = 20
            max_concurrent_batches = 4
            request_timeout_secs = 5
            connect_timeout_secs = 2
        "#;
        let cfg: TrackbatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.max_concurrent_batches, 4);
        assert!(!cfg.verify_tls);
        assert!(cfg.retry.is_none());
        assert!(cfg.pool.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_partial_sections() {
        let toml = r#"
            endpoint = "https://t.17track.net/track/restapi"
            batch_size = 40
            max_concurrent_batches = 25
            request_timeout_secs = 30
            connect_timeout_secs = 10
            verify_tls = true

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5

            [pool]
            max_handles = 8
        "#;
        let cfg: TrackbatchConfig = toml::from_str(toml).unwrap();
        assert!(cfg.verify_tls);
        let retry = cfg.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_unexpected_attempts, 5);
        assert_eq!(retry.max_delay_secs, 60);
        let pool = cfg.pool_config();
        assert_eq!(pool.max_handles, 8);
        assert_eq!(pool.max_connections_per_target, 10);
        assert_eq!(pool.max_connections_per_handle, 10);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut cfg = TrackbatchConfig::default();
        cfg.batch_size = 41;
        assert!(cfg.validate().is_err());
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackbatchConfig::default();
        cfg.max_concurrent_batches = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackbatchConfig::default();
        cfg.retry = Some(RetryConfig {
            jitter_fraction: 1.5,
            ..RetryConfig::default()
        });
        assert!(cfg.validate().is_err());

        let mut cfg = TrackbatchConfig::default();
        cfg.endpoint = "ftp://example.com".into();
        assert!(cfg.validate().is_err());

        for retry in [
            RetryConfig {
                base_delay_secs: 1e20,
                ..RetryConfig::default()
            },
            RetryConfig {
                base_delay_secs: f64::NAN,
                ..RetryConfig::default()
            },
            RetryConfig {
                base_delay_secs: 90.0,
                ..RetryConfig::default()
            },
            RetryConfig {
                max_delay_secs: MAX_RETRY_DELAY_SECS + 1,
                ..RetryConfig::default()
            },
            RetryConfig {
                max_delay_secs: 0,
                ..RetryConfig::default()
            },
        ] {
            let cfg = TrackbatchConfig {
                retry: Some(retry.clone()),
                ..TrackbatchConfig::default()
            };
            assert!(cfg.validate().is_err(), "accepted {:?}", retry);
        }

        let cfg = TrackbatchConfig {
            pool: Some(PoolConfig {
                max_connections_per_target: 0,
                ..PoolConfig::default()
            }),
            ..TrackbatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "batch_size = \"many\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));

        let cfg = TrackbatchConfig {
            batch_size: 10,
            ..TrackbatchConfig::default()
        };
        fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(load_from(&path).unwrap().batch_size, 10);
    }
}
