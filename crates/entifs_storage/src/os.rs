//! Filesystem implementation backed by the operating system.

use crate::backend::FileSystem;
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The real filesystem, via `std::fs` and `tempfile`.
///
/// Stateless; one instance may be shared by any number of stores.
///
/// # Example
///
/// ```no_run
/// use entifs_storage::{FileSystem, OsFileSystem};
/// use std::path::Path;
///
/// let fs = OsFileSystem::new();
/// fs.create_dir(Path::new("db/user")).unwrap();
/// assert!(fs.is_dir(Path::new("db/user")));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// Creates a new OS filesystem handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_writable(&self, path: &Path) -> StorageResult<bool> {
        let metadata = fs::metadata(path).map_err(|e| StorageError::path("stat", path, e))?;
        Ok(!metadata.permissions().readonly())
    }

    fn list_dir(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        let entries = fs::read_dir(path).map_err(|e| StorageError::path("list", path, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::path("list", path, e))?;
            paths.push(entry.path());
        }
        Ok(paths)
    }

    fn create_dir(&self, path: &Path) -> StorageResult<()> {
        // create_dir_all tolerates another thread creating the same directory
        fs::create_dir_all(path).map_err(|e| StorageError::path("create directory", path, e))
    }

    fn create_temp_file(
        &self,
        dir: &Path,
        prefix: &str,
        suffix: &str,
        contents: &[u8],
        sync: bool,
    ) -> StorageResult<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| StorageError::path("create temp file", dir, e))?;

        file.write_all(contents)
            .map_err(|e| StorageError::path("write", file.path(), e))?;
        file.flush()
            .map_err(|e| StorageError::path("flush", file.path(), e))?;
        if sync {
            file.as_file()
                .sync_all()
                .map_err(|e| StorageError::path("sync", file.path(), e))?;
        }

        let (_, path) = file
            .keep()
            .map_err(|e| StorageError::path("keep temp file", dir, e.error))?;
        Ok(path)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        fs::read(path).map_err(|e| StorageError::path("read", path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        fs::rename(from, to).map_err(|e| StorageError::path("rename", from, e))
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        fs::remove_file(path).map_err(|e| StorageError::path("remove", path, e))
    }
}
