//! Error types for storage operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred without a specific path.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An I/O error occurred while operating on a path.
    #[error("{op} failed for {}: {source}", path.display())]
    Path {
        /// The operation that failed (e.g. `rename`).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Creates a path-scoped I/O error.
    pub fn path(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Path {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(err) => err.kind(),
            Self::Path { source, .. } => source.kind(),
        }
    }

    /// Returns true if the error means the path did not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == io::ErrorKind::NotFound
    }
}
