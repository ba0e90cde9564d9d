//! # EntiFS Core
//!
//! Core engine for EntiFS, a file-per-entity store.
//!
//! Every entity lives in its own JSON file at `<base>/<kind>/<id>`.
//! This crate provides:
//! - [`Key`] and the `kind:id` reference codec
//! - [`Entity`], an explicit `{key, fields}` record
//! - Per-kind id allocation with base-36 ids
//! - [`Store`], which stages writes into temp files and reads entity files
//! - [`Transaction`], which promotes staged files by rename on commit
//! - [`EntityStore`], auto-commit wrappers and in-memory listing
//!
//! ## Example
//!
//! ```rust
//! use entifs_core::{EntityStore, Fields};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let entities = EntityStore::open(dir.path().join("db")).unwrap();
//!
//! let mut fields = Fields::new();
//! fields.insert("name".into(), json!("Alice"));
//! let alice = entities.create("user", fields).unwrap();
//! entities.save(&alice, None).unwrap();
//!
//! assert_eq!(alice.key().to_string(), "user:1");
//! let loaded = entities.get("user", "1").unwrap().unwrap();
//! assert_eq!(loaded, alice);
//! ```
//!
//! ## Guarantees
//!
//! Commit is atomic per entity, not per transaction: each staged file is
//! renamed onto its target independently, and a failed rename leaves the
//! staged file in the base directory and is reported as a
//! [`CommitWarning`] rather than an error.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alloc;
mod config;
mod entity;
mod error;
mod query;
mod store;
mod transaction;

pub use alloc::{encode_base36, IdAllocator};
pub use config::{Config, DEFAULT_BASE_DIR};
pub use entity::{Entity, EntityArg, EntityStore, Fields, Key};
pub use error::{CoreError, CoreResult};
pub use query::{compare_values, ListOptions, Order};
pub use store::Store;
pub use transaction::{
    CommitReport, CommitWarning, DeleteResource, PathLocks, PendingResource, Transaction,
    TransactionId, TransactionState, UpdateResource,
};

pub use entifs_storage::{FileSystem, OsFileSystem, StorageError};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
