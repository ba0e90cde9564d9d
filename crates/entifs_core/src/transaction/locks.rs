//! Per-path commit locks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A table of mutexes keyed by target path.
///
/// Commit holds the lock of a target across its remove-then-rename (or its
/// delete) so two transactions writing the same entity cannot interleave
/// their steps. Entries are created on demand and dropped once no thread
/// holds or waits for them.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `path`.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut map = self.locks.lock();
            Arc::clone(map.entry(path.to_path_buf()).or_default())
        };

        let result = {
            let _guard = lock.lock();
            f()
        };

        let mut map = self.locks.lock();
        // Clones are only handed out under the map lock, so a count of two
        // (map + ours) means nobody else holds or waits for this entry.
        if Arc::strong_count(&lock) == 2 {
            map.remove(path);
        }
        result
    }

    /// Returns the number of paths currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no path is currently tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
