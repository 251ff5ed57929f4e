//! Result files for one run.
//!
//! Every run appends to four files in the output directory, all prefixed with
//! the run's Unix timestamp: resolved (`_tracks.txt`), partial
//! (`_1strings.txt`), unresolved (`_not_found.txt`), and the fallback for
//! batches that were given up (`_unchecked.txt`). Records are UTF-8 and
//! written whole, so concurrent batches never interleave inside a record.

mod format;
mod writer;

pub use format::{format_numbers, format_partial, format_resolved, MISSING_TIMESTAMP};
pub use writer::ResultStore;

use std::path::{Path, PathBuf};

/// Paths of the four result files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPaths {
    pub resolved: PathBuf,
    pub partial: PathBuf,
    pub not_found: PathBuf,
    pub unchecked: PathBuf,
}

impl ResultPaths {
    pub fn new(dir: &Path, run_ts: u64) -> Self {
        Self {
            resolved: dir.join(format!("{}_tracks.txt", run_ts)),
            partial: dir.join(format!("{}_1strings.txt", run_ts)),
            not_found: dir.join(format!("{}_not_found.txt", run_ts)),
            unchecked: dir.join(format!("{}_unchecked.txt", run_ts)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            self.resolved.as_path(),
            self.partial.as_path(),
            self.not_found.as_path(),
            self.unchecked.as_path(),
        ]
        .into_iter()
    }
}
