//! Concurrent access safety for mirror operations
//!
//! Provides per-path locking so that operations targeting the same resolved
//! path never interleave, while operations on different paths proceed
//! concurrently. Two syncs of the same node would otherwise race on fetch,
//! delete and rewrite with last-writer-wins content.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-path lock manager.
///
/// The guarded section awaits (network fetch, blocking write handoff), so
/// the per-path lock is an async mutex; only the map lookup itself uses a
/// synchronous lock.
pub struct PathLockManager {
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for a resolved path.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        // Double-check after taking the write lock; another task may have
        // inserted the entry in between.
        let mut map = self.locks.write();
        map.entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}
