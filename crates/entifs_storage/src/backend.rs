//! Filesystem trait definition.

use crate::error::StorageResult;
use std::path::{Path, PathBuf};

/// The synchronous filesystem API the entity store is built on.
///
/// Every method is a single blocking call. Callers assume arbitrary
/// preemption between any two calls; implementations do not add any
/// cross-call synchronization.
///
/// # Invariants
///
/// - `create_temp_file` never returns a path that already existed
/// - `rename` replaces nothing: callers remove an existing destination first
/// - `list_dir` returns entries in whatever order the platform yields them
///
/// # Implementors
///
/// - [`super::OsFileSystem`] - The real filesystem
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns true if the entry at `path` is hidden.
    ///
    /// The default treats dot-prefixed names as hidden.
    fn is_hidden(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Returns true if the file at `path` may be written.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read.
    fn is_writable(&self, path: &Path) -> StorageResult<bool>;

    /// Lists the entries of the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list_dir(&self, path: &Path) -> StorageResult<Vec<PathBuf>>;

    /// Creates the directory at `path`, including missing parents.
    ///
    /// Succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir(&self, path: &Path) -> StorageResult<()>;

    /// Creates a uniquely named file in `dir` holding `contents`.
    ///
    /// The file name starts with `prefix`, ends with `suffix` and carries a
    /// random part in between. When `sync` is true the contents are flushed
    /// to disk before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn create_temp_file(
        &self,
        dir: &Path,
        prefix: &str,
        suffix: &str,
        contents: &[u8],
        sync: bool,
    ) -> StorageResult<PathBuf>;

    /// Reads the full contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Moves the file at `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the move fails. The source is left in place.
    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed. A missing file is
    /// reported as an error whose [`is_not_found`] is true.
    ///
    /// [`is_not_found`]: crate::StorageError::is_not_found
    fn remove_file(&self, path: &Path) -> StorageResult<()>;
}
