//! Per-dataset writer locks
//!
//! Adds and removes of one id run one at a time; different ids never
//! contend. An id's lock is dropped from the table once nobody holds or
//! waits on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

#[derive(Debug, Default)]
pub struct WriterLocks {
    locks: LockTable,
}

impl WriterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other writer holds `id`
    pub async fn acquire(&self, id: &str) -> WriterGuard<'_> {
        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            table.entry(id.to_string()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        WriterGuard {
            locks: &self.locks,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids with a live lock
    pub fn active(&self) -> usize {
        self.locks.lock().map(|t| t.len()).unwrap_or(0)
    }
}

/// Held for the duration of one write
pub struct WriterGuard<'a> {
    locks: &'a LockTable,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        // release before pruning so the count below excludes this holder
        self.guard.take();
        if let Ok(mut table) = self.locks.lock() {
            let idle = table
                .get(&self.id)
                .map_or(false, |lock| Arc::strong_count(lock) == 1);
            if idle {
                table.remove(&self.id);
            }
        }
    }
}
