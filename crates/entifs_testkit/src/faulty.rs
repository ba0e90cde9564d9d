//! Fault injection for commit tests.

use entifs_storage::{FileSystem, OsFileSystem, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// A filesystem that fails chosen operations on chosen paths.
///
/// Everything else is passed to the real filesystem. Failures are
/// matched against the destination of a rename and the path of a remove.
///
/// # Example
///
/// ```rust
/// use entifs_storage::FileSystem;
/// use entifs_testkit::FaultyFileSystem;
/// use std::path::Path;
///
/// let fs = FaultyFileSystem::new();
/// fs.fail_rename_to(Path::new("db/user/1"));
/// assert!(fs.rename(Path::new("a"), Path::new("db/user/1")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct FaultyFileSystem {
    inner: OsFileSystem,
    rename_targets: Mutex<HashSet<PathBuf>>,
    remove_targets: Mutex<HashSet<PathBuf>>,
    renames: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FaultyFileSystem {
    /// Creates a filesystem with no faults armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every rename onto `target` fail.
    pub fn fail_rename_to(&self, target: &Path) {
        self.rename_targets.lock().insert(target.to_path_buf());
    }

    /// Makes every removal of `path` fail.
    pub fn fail_remove_of(&self, path: &Path) {
        self.remove_targets.lock().insert(path.to_path_buf());
    }

    /// Disarms every fault.
    pub fn heal(&self) {
        self.rename_targets.lock().clear();
        self.remove_targets.lock().clear();
    }

    /// Returns the successful renames in the order they happened.
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renames.lock().clone()
    }

    fn injected(op: &'static str, path: &Path) -> StorageError {
        StorageError::path(op, path, io::Error::other("injected fault"))
    }
}

impl FileSystem for FaultyFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn is_writable(&self, path: &Path) -> StorageResult<bool> {
        self.inner.is_writable(path)
    }

    fn list_dir(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        self.inner.list_dir(path)
    }

    fn create_dir(&self, path: &Path) -> StorageResult<()> {
        self.inner.create_dir(path)
    }

    fn create_temp_file(
        &self,
        dir: &Path,
        prefix: &str,
        suffix: &str,
        contents: &[u8],
        sync: bool,
    ) -> StorageResult<PathBuf> {
        self.inner
            .create_temp_file(dir, prefix, suffix, contents, sync)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        if self.rename_targets.lock().contains(to) {
            return Err(Self::injected("rename", from));
        }
        self.inner.rename(from, to)?;
        self.renames.lock().push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        if self.remove_targets.lock().contains(path) {
            return Err(Self::injected("remove", path));
        }
        self.inner.remove_file(path)
    }
}
