//! `trackbatch config` – print the effective configuration.

use anyhow::Result;
use std::path::Path;
use trackbatch_core::config::TrackbatchConfig;

pub fn show_config(cfg: &TrackbatchConfig, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", cfg.to_toml()?);

    if cfg.retry.is_none() {
        let retry = cfg.retry_config();
        println!();
        println!("# [retry] defaults in effect");
        println!(
            "#   max_attempts = {}, max_unexpected_attempts = {}, base_delay_secs = {}, max_delay_secs = {}",
            retry.max_attempts, retry.max_unexpected_attempts, retry.base_delay_secs, retry.max_delay_secs
        );
    }
    if cfg.pool.is_none() {
        let pool = cfg.pool_config();
        println!();
        println!("# [pool] defaults in effect");
        println!(
            "#   max_handles = {}, max_connections_per_handle = {}, idle_timeout_secs = {}",
            pool.max_handles, pool.max_connections_per_handle, pool.idle_timeout_secs
        );
    }
    Ok(())
}
