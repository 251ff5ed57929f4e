//! Append-only writer for the result files of one run.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::format::{format_numbers, format_partial, format_resolved};
use super::ResultPaths;
use crate::batch::Batch;
use crate::tracking::ClassifiedResult;

/// Appends result records. Safe to clone and share between batch tasks;
/// writes are serialized and run on the blocking pool.
#[derive(Debug, Clone)]
pub struct ResultStore {
    paths: Arc<ResultPaths>,
    lock: Arc<Mutex<()>>,
}

impl ResultStore {
    /// Creates `dir` if needed. Files themselves are created on first write.
    pub fn open(dir: &Path, run_ts: u64) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;
        Ok(Self::with_paths(ResultPaths::new(dir, run_ts)))
    }

    pub fn with_paths(paths: ResultPaths) -> Self {
        Self {
            paths: Arc::new(paths),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn paths(&self) -> &ResultPaths {
        &self.paths
    }

    /// Appends all three groups of a successful batch. Empty groups are skipped.
    pub async fn append_classified(&self, result: &ClassifiedResult) -> Result<()> {
        let writes = vec![
            (self.paths.resolved.clone(), format_resolved(&result.resolved)),
            (self.paths.partial.clone(), format_partial(&result.partial)),
            (
                self.paths.not_found.clone(),
                format_numbers(result.unresolved.iter().map(String::as_str)),
            ),
        ];
        self.append_all(writes).await
    }

    /// Appends every number of a given-up batch to the fallback file.
    pub async fn append_unchecked(&self, batch: &Batch) -> Result<()> {
        let text = format_numbers(batch.iter().map(|n| n.as_str()));
        self.append_all(vec![(self.paths.unchecked.clone(), text)])
            .await
    }

    async fn append_all(&self, writes: Vec<(PathBuf, String)>) -> Result<()> {
        let lock = Arc::clone(&self.lock);
        tokio::task::spawn_blocking(move || {
            let _guard = lock
                .lock()
                .map_err(|_| anyhow::anyhow!("result store lock poisoned"))?;
            for (path, text) in writes {
                if !text.is_empty() {
                    append(&path, &text)?;
                }
            }
            Ok(())
        })
        .await
        .context("result write task join")?
    }
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
