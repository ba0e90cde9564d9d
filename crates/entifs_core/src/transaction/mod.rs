//! Staged transactions.
//!
//! A transaction collects staged updates and deletes and applies them on
//! commit. There is no log and no rollback:
//! - **Per-entity atomicity**: each update is a remove-then-rename of one file
//! - **Partial failure tolerance**: a failed promotion is a warning and the
//!   remaining resources are still applied
//! - **Serialized targets**: commits touching the same file take turns

mod locks;
mod state;

pub use locks::PathLocks;
pub use state::{
    CommitReport, CommitWarning, DeleteResource, PendingResource, Transaction, TransactionId,
    TransactionState, UpdateResource,
};
