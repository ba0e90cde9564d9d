//! Stress tests for EntiFS.
//!
//! These exercise the store from several threads at once.

use entifs_core::{Entity, EntityStore, Fields, Key};
use serde_json::Value;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        Self {
            successful_ops: successful,
            failed_ops: failed,
            duration,
        }
    }

    /// Total operations performed.
    pub fn total_ops(&self) -> usize {
        self.successful_ops + self.failed_ops
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of threads.
    pub threads: usize,
    /// Operations per thread.
    pub ops_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            ops_per_thread: 50,
        }
    }
}

/// Creates entities of `kind` from several threads and returns their keys.
///
/// Every thread allocates its own ids through the shared store.
pub fn stress_concurrent_creates(
    entities: &EntityStore,
    kind: &str,
    config: &StressConfig,
) -> (StressTestResult, Vec<Key>) {
    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let entities = EntityStore::new(Arc::clone(entities.store()));
            let kind = kind.to_string();
            let ops = config.ops_per_thread;
            thread::spawn(move || {
                let mut keys = Vec::with_capacity(ops);
                let mut failed = 0;
                for i in 0..ops {
                    let mut fields = Fields::new();
                    fields.insert("thread".into(), Value::from(t));
                    fields.insert("seq".into(), Value::from(i));
                    let saved = entities
                        .create(&kind, fields)
                        .and_then(|entity| entities.save(&entity, None).map(|()| entity));
                    match saved {
                        Ok(entity) => keys.push(entity.into_parts().0),
                        Err(_) => failed += 1,
                    }
                }
                (keys, failed)
            })
        })
        .collect();

    let mut keys = Vec::new();
    let mut failed = 0;
    for handle in handles {
        let (mut k, f) = handle.join().expect("stress thread panicked");
        keys.append(&mut k);
        failed += f;
    }
    (StressTestResult::new(keys.len(), failed, start.elapsed()), keys)
}

/// Overwrites one key from several threads, each write tagged with its writer.
pub fn stress_same_key_writes(
    entities: &EntityStore,
    key: &Key,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let entities = EntityStore::new(Arc::clone(entities.store()));
            let key = key.clone();
            let ops = config.ops_per_thread;
            thread::spawn(move || {
                let mut ok = 0;
                for i in 0..ops {
                    let mut entity = Entity::new(key.clone(), Fields::new());
                    entity.set("writer", t);
                    entity.set("seq", i);
                    if entities.save(&entity, None).is_ok() {
                        ok += 1;
                    }
                }
                (ok, ops - ok)
            })
        })
        .collect();

    let (mut ok, mut failed) = (0, 0);
    for handle in handles {
        let (o, f) = handle.join().expect("stress thread panicked");
        ok += o;
        failed += f;
    }
    StressTestResult::new(ok, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;
    use std::collections::HashSet;

    #[test]
    fn concurrent_creates_never_share_an_id() {
        let store = TestStore::new();
        let config = StressConfig {
            threads: 8,
            ops_per_thread: 25,
        };

        let (result, keys) = stress_concurrent_creates(&store, "job", &config);

        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops(), 200);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(store.all("job").unwrap().len(), 200);
    }

    #[test]
    fn same_key_writes_leave_one_complete_version() {
        let store = TestStore::new();
        let key = Key::new("counter", "1").unwrap();
        let config = StressConfig {
            threads: 4,
            ops_per_thread: 30,
        };

        let result = stress_same_key_writes(&store, &key, &config);

        assert_eq!(result.successful_ops, 120);
        let entity = store.get("counter", "1").unwrap().unwrap();
        assert!(entity.get("writer").is_some());
        assert!(entity.get("seq").is_some());
        assert!(store.store().staged_files().unwrap().is_empty());
    }
}
