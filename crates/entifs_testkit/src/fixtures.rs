//! Test fixtures and store helpers.
//!
//! Every fixture gets its own temporary base directory, so tests never
//! share a store.

use entifs_core::{Config, EntityStore, Fields, FileSystem, Store};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A store in a temporary directory, removed on drop.
pub struct TestStore {
    /// The entity store.
    pub entities: EntityStore,
    _temp_dir: TempDir,
}

impl TestStore {
    /// Creates a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a store with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open_with_config(temp_dir.path().join("db"), config)
            .expect("Failed to open store");
        Self {
            entities: EntityStore::new(Arc::new(store)),
            _temp_dir: temp_dir,
        }
    }

    /// Creates a store over a custom filesystem.
    pub fn with_file_system(fs: Arc<dyn FileSystem>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::with_file_system(temp_dir.path().join("db"), Config::default(), fs)
            .expect("Failed to open store");
        Self {
            entities: EntityStore::new(Arc::new(store)),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Store {
        self.entities.store()
    }

    /// Returns the base directory.
    pub fn base(&self) -> &Path {
        self.store().base()
    }

    /// Returns the path of `kind/id` under the base directory.
    pub fn entity_file(&self, kind: &str, id: &str) -> PathBuf {
        self.base().join(kind).join(id)
    }

    /// Reads an entity file as a string.
    pub fn read_entity_file(&self, kind: &str, id: &str) -> Option<String> {
        std::fs::read_to_string(self.entity_file(kind, id)).ok()
    }

    /// Writes an entity file directly, bypassing transactions.
    pub fn write_entity_file(&self, kind: &str, id: &str, content: &str) {
        let dir = self.base().join(kind);
        std::fs::create_dir_all(&dir).expect("Failed to create kind directory");
        std::fs::write(dir.join(id), content).expect("Failed to write entity file");
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = EntityStore;

    fn deref(&self) -> &Self::Target {
        &self.entities
    }
}

/// Runs a test with a temporary store.
///
/// # Example
///
/// ```rust,ignore
/// use entifs_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|entities| {
///         assert!(entities.all("user")?.is_empty());
///         Ok(())
///     })
///     .unwrap();
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&EntityStore) -> R,
{
    let test_store = TestStore::new();
    f(&test_store.entities)
}

/// Converts a JSON object literal into fields.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn fields_of(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected a JSON object, got {other}"),
    }
}
