//! CLI command handlers, one per file.

mod config;
mod fingerprint;
mod run;

pub use config::show_config;
pub use fingerprint::run_fingerprint;
pub use run::{run_batches, RunArgs};
