//! Shared pool of curl easy handles.
//!
//! A handle keeps its connection cache across `reset`, so returning handles to
//! the pool lets later batches reuse warm connections. One semaphore bounds the
//! number of handles alive at once and a second, per target (proxy or origin),
//! bounds concurrent transfers to the same peer. Idle handles older than
//! `idle_timeout` are dropped (closing their connections) instead of being
//! reused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use curl::easy::Easy;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum handles checked out or idle at once.
    pub max_handles: usize,
    /// Concurrent transfers to one target.
    pub max_per_target: usize,
    /// Cached connections per handle (`CURLOPT_MAXCONNECTS`).
    pub max_connections_per_handle: u32,
    /// Idle handles older than this are discarded.
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::from(&PoolConfig::default())
    }
}

impl From<&PoolConfig> for PoolSettings {
    fn from(cfg: &PoolConfig) -> Self {
        Self {
            max_handles: cfg.max_handles.max(1),
            max_per_target: cfg.max_connections_per_target.max(1),
            max_connections_per_handle: cfg.max_connections_per_handle.max(1),
            idle_timeout: Duration::from_secs(cfg.idle_timeout_secs),
        }
    }
}

struct IdleHandle {
    easy: Easy,
    since: Instant,
}

/// Process-wide handle pool; safe for concurrent use.
pub struct EasyPool {
    settings: PoolSettings,
    permits: Arc<Semaphore>,
    targets: Mutex<HashMap<String, Arc<Semaphore>>>,
    idle: Mutex<Vec<IdleHandle>>,
}

impl std::fmt::Debug for EasyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasyPool")
            .field("settings", &self.settings)
            .field("idle", &self.idle_count())
            .finish()
    }
}

impl EasyPool {
    pub fn new(settings: PoolSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            permits: Arc::new(Semaphore::new(settings.max_handles.max(1))),
            targets: Mutex::new(HashMap::new()),
            idle: Mutex::new(Vec::new()),
        })
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Handles currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Waits for a free slot for `target`, then for a global slot, and hands
    /// out a warm handle or a fresh one. Returns `None` only if the pool was
    /// closed.
    pub async fn acquire(self: &Arc<Self>, target: &str) -> Option<PooledEasy> {
        let target_permit = self.target_semaphore(target)?.acquire_owned().await.ok()?;
        let permit = Arc::clone(&self.permits).acquire_owned().await.ok()?;
        let easy = self.take_idle().unwrap_or_else(Easy::new);
        Some(PooledEasy {
            easy: Some(easy),
            pool: Arc::clone(self),
            discard: false,
            _permit: permit,
            _target_permit: target_permit,
        })
    }

    /// Stops handing out handles and drops every idle one.
    pub fn close(&self) {
        self.permits.close();
        if let Ok(targets) = self.targets.lock() {
            for sem in targets.values() {
                sem.close();
            }
        }
        if let Ok(mut idle) = self.idle.lock() {
            idle.clear();
        }
    }

    fn target_semaphore(&self, target: &str) -> Option<Arc<Semaphore>> {
        if self.permits.is_closed() {
            return None;
        }
        let mut targets = self.targets.lock().ok()?;
        let sem = targets
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.settings.max_per_target.max(1))));
        Some(Arc::clone(sem))
    }

    fn take_idle(&self) -> Option<Easy> {
        let mut idle = self.idle.lock().ok()?;
        let now = Instant::now();
        let before = idle.len();
        idle.retain(|h| now.duration_since(h.since) < self.settings.idle_timeout);
        if idle.len() < before {
            tracing::debug!(expired = before - idle.len(), "dropped idle curl handles");
        }
        idle.pop().map(|h| h.easy)
    }

    fn park(&self, easy: Easy) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(IdleHandle {
                easy,
                since: Instant::now(),
            });
        }
    }
}

/// A checked-out handle. Returned to the pool on drop unless discarded.
pub struct PooledEasy {
    easy: Option<Easy>,
    pool: Arc<EasyPool>,
    discard: bool,
    _permit: OwnedSemaphorePermit,
    _target_permit: OwnedSemaphorePermit,
}

impl PooledEasy {
    pub fn easy(&mut self) -> &mut Easy {
        // Only `Drop` takes the handle out.
        self.easy.get_or_insert_with(Easy::new)
    }

    /// Drop the handle (and its connections) instead of returning it.
    pub fn discard(&mut self) {
        self.discard = true;
    }
}

impl Drop for PooledEasy {
    fn drop(&mut self) {
        if let Some(easy) = self.easy.take() {
            if !self.discard {
                self.pool.park(easy);
            }
        }
    }
}
