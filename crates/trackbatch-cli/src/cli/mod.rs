//! CLI for trackbatch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trackbatch_core::config::{self, TrackbatchConfig};

use commands::{run_batches, run_fingerprint, show_config, RunArgs};

/// Top-level CLI for trackbatch.
#[derive(Debug, Parser)]
#[command(name = "trackbatch")]
#[command(about = "Batch shipment status lookups against the 17track endpoint", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/trackbatch/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Look up every track number in INPUT and write the result files.
    Run {
        /// Text file with one track number per line.
        input: PathBuf,
        /// File with one proxy URI per line; a random one is used per attempt.
        #[arg(long, value_name = "FILE")]
        proxies: Option<PathBuf>,
        /// Directory for result files (default: current directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Batches in flight at once (default: max_concurrent_batches from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Print the request body and fingerprint for the given numbers.
    Fingerprint {
        /// Track numbers (at most 40).
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Print the effective configuration and where it was loaded from.
    Config,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg, path) = load_config(cli.config)?;
        tracing::debug!("loaded config from {}: {:?}", path.display(), cfg);

        match cli.command {
            CliCommand::Run {
                input,
                proxies,
                output_dir,
                jobs,
            } => {
                let output_dir = match output_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_batches(
                    &cfg,
                    RunArgs {
                        input,
                        proxies,
                        output_dir,
                        jobs,
                    },
                )
                .await?
            }
            CliCommand::Fingerprint { numbers } => run_fingerprint(&numbers)?,
            CliCommand::Config => show_config(&cfg, &path)?,
        }

        Ok(())
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<(TrackbatchConfig, PathBuf)> {
    match explicit {
        Some(path) => Ok((config::load_from(&path)?, path)),
        None => {
            let cfg = config::load_or_init()?;
            cfg.validate()?;
            Ok((cfg, config::config_path()?))
        }
    }
}

#[cfg(test)]
mod tests;
