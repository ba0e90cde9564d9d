//! Error types for EntiFS core.

use entifs_storage::StorageError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in EntiFS core operations.
///
/// Commit warnings are not errors: see [`crate::CommitWarning`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem call failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A directory could not be created or is not a directory.
    #[error("directory unavailable: {}: {reason}", path.display())]
    DirectoryUnavailable {
        /// The directory path.
        path: PathBuf,
        /// Why the directory is unusable.
        reason: String,
    },

    /// An entity file exists but may not be overwritten.
    #[error("no write permission for {}", path.display())]
    NotWritable {
        /// The entity file path.
        path: PathBuf,
    },

    /// A path expected to be a regular file is something else.
    #[error("not a regular file: {}", path.display())]
    NotRegularFile {
        /// The offending path.
        path: PathBuf,
    },

    /// An entity file does not hold a JSON object.
    #[error("entity file does not contain a JSON object: {}", path.display())]
    NotAnObject {
        /// The entity file path.
        path: PathBuf,
    },

    /// A key or key reference is missing, empty or wrong-shaped.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// Configuration value that the store can't work with.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a directory unavailable error.
    pub fn directory_unavailable(path: &Path, reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Creates a not writable error.
    pub fn not_writable(path: &Path) -> Self {
        Self::NotWritable {
            path: path.to_path_buf(),
        }
    }

    /// Creates a not regular file error.
    pub fn not_regular_file(path: &Path) -> Self {
        Self::NotRegularFile {
            path: path.to_path_buf(),
        }
    }

    /// Creates a not an object error.
    pub fn not_an_object(path: &Path) -> Self {
        Self::NotAnObject {
            path: path.to_path_buf(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for faults raised by the storage layer or by an
    /// unusable entity path.
    #[must_use]
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::DirectoryUnavailable { .. }
                | Self::NotWritable { .. }
                | Self::NotRegularFile { .. }
        )
    }

    /// Returns true if this is an invalid key error.
    #[must_use]
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }
}
