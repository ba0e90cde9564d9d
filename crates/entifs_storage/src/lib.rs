//! # EntiFS Storage
//!
//! Filesystem primitives for EntiFS.
//!
//! This crate is the lowest layer of EntiFS. It exposes the small set of
//! synchronous filesystem calls the entity store is built on, behind the
//! [`FileSystem`] trait, so the store can be driven by the real OS
//! filesystem or by a wrapper that injects faults in tests.
//!
//! ## Design Principles
//!
//! - Every call is blocking and either succeeds or reports an OS failure
//! - No knowledge of keys, entities or transactions
//! - Implementations must be `Send + Sync` so one store can be shared
//!
//! ## Example
//!
//! ```rust
//! use entifs_storage::{FileSystem, OsFileSystem};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let fs = OsFileSystem::new();
//! let staged = fs
//!     .create_temp_file(dir.path(), "note1.", ".tmp", b"{}", false)
//!     .unwrap();
//! fs.rename(&staged, &dir.path().join("note")).unwrap();
//! assert_eq!(fs.read(&dir.path().join("note")).unwrap(), b"{}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod os;

pub use backend::FileSystem;
pub use error::{StorageError, StorageResult};
pub use os::OsFileSystem;
