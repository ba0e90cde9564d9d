//! Transaction state and commit.

use crate::error::{CoreError, CoreResult};
use crate::transaction::PathLocks;
use entifs_storage::{FileSystem, StorageResult};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Identifier of a transaction within one store, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction accepts resources.
    Open,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// A staged write: `staged` replaces `target` on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResource {
    /// The entity file to be written.
    pub target: PathBuf,
    /// The staged file holding the new content.
    pub staged: PathBuf,
}

/// A registered delete of `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResource {
    /// The entity file to be removed.
    pub target: PathBuf,
}

/// A resource held by an open transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingResource {
    /// Promote a staged file onto its target.
    Update(UpdateResource),
    /// Remove a target.
    Delete(DeleteResource),
}

/// A staged update that could not be promoted during commit.
///
/// The staged file is left on disk and holds the content that was meant
/// to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitWarning {
    /// The entity file that was not written.
    pub target: PathBuf,
    /// The staged file that still holds the committed version.
    pub staged: PathBuf,
    /// The underlying failure.
    pub reason: String,
}

impl fmt::Display for CommitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "couldn't move {} to {}, committed version is in {}: {}",
            self.staged.display(),
            self.target.display(),
            self.staged.display(),
            self.reason
        )
    }
}

/// Outcome of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Staged updates moved onto their targets.
    pub promoted: usize,
    /// Targets removed by deletes.
    pub deleted: usize,
    /// Updates that stayed staged.
    pub warnings: Vec<CommitWarning>,
}

impl CommitReport {
    /// Returns true if every update was promoted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A batch of staged updates and deletes.
///
/// Transactions are created by [`crate::Store::begin`] and filled by
/// [`crate::Store::store`] and [`crate::Store::remove`]. Nothing touches the
/// entity files until [`Transaction::commit`]. Commit and abort are
/// terminal; every further call fails with
/// [`CoreError::InvalidOperation`].
///
/// Dropping an open transaction aborts it.
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    updates: Vec<UpdateResource>,
    deletes: Vec<DeleteResource>,
    fs: Arc<dyn FileSystem>,
    locks: Arc<PathLocks>,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, fs: Arc<dyn FileSystem>, locks: Arc<PathLocks>) -> Self {
        Self {
            id,
            state: TransactionState::Open,
            updates: Vec::new(),
            deletes: Vec::new(),
            fs,
            locks,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction still accepts resources.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Registers a staged update.
    pub fn update_resource(&mut self, resource: UpdateResource) -> CoreResult<()> {
        self.ensure_open()?;
        self.updates.push(resource);
        Ok(())
    }

    /// Registers a delete.
    pub fn delete_resource(&mut self, resource: DeleteResource) -> CoreResult<()> {
        self.ensure_open()?;
        self.deletes.push(resource);
        Ok(())
    }

    /// Registers either kind of resource.
    pub fn register(&mut self, resource: PendingResource) -> CoreResult<()> {
        match resource {
            PendingResource::Update(update) => self.update_resource(update),
            PendingResource::Delete(delete) => self.delete_resource(delete),
        }
    }

    /// Returns the registered updates in order.
    #[must_use]
    pub fn updates(&self) -> &[UpdateResource] {
        &self.updates
    }

    /// Returns the registered deletes in order.
    #[must_use]
    pub fn deletes(&self) -> &[DeleteResource] {
        &self.deletes
    }

    /// Returns all registered resources, updates first.
    pub fn pending(&self) -> impl Iterator<Item = PendingResource> + '_ {
        self.updates
            .iter()
            .cloned()
            .map(PendingResource::Update)
            .chain(self.deletes.iter().cloned().map(PendingResource::Delete))
    }

    /// Applies every resource.
    ///
    /// Updates run first, in registration order. For each, an existing
    /// target is removed and the staged file is renamed onto it. If either
    /// step fails the staged file stays where it is, a [`CommitWarning`] is
    /// logged and recorded, and commit moves on; earlier resources are not
    /// rolled back. Deletes run afterwards; a missing target is fine.
    ///
    /// A crash or failure between removing the old target and the rename
    /// leaves that one entity absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the transaction was
    /// already committed or aborted. Filesystem failures never surface as
    /// errors here.
    pub fn commit(&mut self) -> CoreResult<CommitReport> {
        self.ensure_open()?;
        let updates = std::mem::take(&mut self.updates);
        let deletes = std::mem::take(&mut self.deletes);
        let mut report = CommitReport::default();

        for update in updates {
            let outcome = self
                .locks
                .with_lock(&update.target, || self.promote(&update));
            match outcome {
                Ok(()) => report.promoted += 1,
                Err(err) => {
                    let warning = CommitWarning {
                        target: update.target,
                        staged: update.staged,
                        reason: err.to_string(),
                    };
                    error!(txn = %self.id, "{warning}");
                    report.warnings.push(warning);
                }
            }
        }

        for delete in deletes {
            let outcome = self
                .locks
                .with_lock(&delete.target, || self.fs.remove_file(&delete.target));
            match outcome {
                Ok(()) => report.deleted += 1,
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    warn!(txn = %self.id, target = %delete.target.display(), error = %err, "delete skipped");
                }
            }
        }

        self.state = TransactionState::Committed;
        debug!(
            txn = %self.id,
            promoted = report.promoted,
            deleted = report.deleted,
            warnings = report.warnings.len(),
            "committed"
        );
        Ok(report)
    }

    /// Discards the transaction.
    ///
    /// Removes every staged file; targets are untouched and registered
    /// deletes are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the transaction was
    /// already committed or aborted.
    pub fn abort(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        self.discard();
        self.state = TransactionState::Aborted;
        debug!(txn = %self.id, "aborted");
        Ok(())
    }

    fn promote(&self, update: &UpdateResource) -> StorageResult<()> {
        // Some platforms refuse to rename onto an existing file.
        if self.fs.exists(&update.target) {
            self.fs.remove_file(&update.target)?;
        }
        self.fs.rename(&update.staged, &update.target)
    }

    fn discard(&mut self) {
        for update in std::mem::take(&mut self.updates) {
            match self.fs.remove_file(&update.staged) {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    warn!(txn = %self.id, staged = %update.staged.display(), error = %err, "staged file not removed");
                }
            }
        }
        self.deletes.clear();
    }

    fn ensure_open(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Open => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_open() && !self.updates.is_empty() {
            debug!(txn = %self.id, staged = self.updates.len(), "dropping open transaction");
            self.discard();
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("updates", &self.updates)
            .field("deletes", &self.deletes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entifs_storage::OsFileSystem;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn create_txn() -> Transaction {
        Transaction::new(
            TransactionId(1),
            Arc::new(OsFileSystem::new()),
            Arc::new(PathLocks::new()),
        )
    }

    fn stage(dir: &TempDir, content: &str) -> PathBuf {
        OsFileSystem::new()
            .create_temp_file(dir.path(), "user1.", ".tmp", content.as_bytes(), false)
            .unwrap()
    }

    fn update(dir: &TempDir, target: &str, content: &str) -> UpdateResource {
        UpdateResource {
            target: dir.path().join(target),
            staged: stage(dir, content),
        }
    }

    #[test]
    fn new_transaction_is_open() {
        let txn = create_txn();
        assert!(txn.is_open());
        assert_eq!(txn.state(), TransactionState::Open);
        assert_eq!(txn.id().to_string(), "txn:1");
    }

    #[test]
    fn commit_promotes_into_missing_target() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();
        let res = update(&dir, "1", r#"{"a":1}"#);
        let staged = res.staged.clone();
        txn.update_resource(res).unwrap();

        let report = txn.commit().unwrap();

        assert_eq!(report.promoted, 1);
        assert!(report.is_clean());
        assert!(!staged.exists());
        assert_eq!(fs::read_to_string(dir.path().join("1")).unwrap(), r#"{"a":1}"#);
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.updates().is_empty());
    }

    #[test]
    fn commit_replaces_existing_target() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1"), r#"{"old":true,"extra":1}"#).unwrap();
        let mut txn = create_txn();
        txn.update_resource(update(&dir, "1", r#"{"new":true}"#)).unwrap();

        txn.commit().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("1")).unwrap(), r#"{"new":true}"#);
    }

    #[test]
    fn failed_promotion_is_a_warning() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();

        // A non-empty directory at the target cannot be removed as a file.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("inner"), "x").unwrap();
        let first = update(&dir, "blocked", r#"{"a":1}"#);
        let first_staged = first.staged.clone();
        txn.update_resource(first).unwrap();
        txn.update_resource(update(&dir, "2", r#"{"b":2}"#)).unwrap();

        let report = txn.commit().unwrap();

        assert_eq!(report.promoted, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].staged, first_staged);
        assert!(first_staged.exists());
        assert_eq!(fs::read_to_string(dir.path().join("2")).unwrap(), r#"{"b":2}"#);
    }

    #[test]
    fn missing_staged_file_is_a_warning() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();
        let res = update(&dir, "1", "{}");
        fs::remove_file(&res.staged).unwrap();
        txn.update_resource(res).unwrap();

        let report = txn.commit().unwrap();
        assert_eq!(report.promoted, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].to_string().contains("committed version is in"));
    }

    #[test]
    fn deletes_run_after_updates() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();
        let target = dir.path().join("1");
        txn.delete_resource(DeleteResource {
            target: target.clone(),
        })
        .unwrap();
        txn.update_resource(update(&dir, "1", "{}")).unwrap();

        let report = txn.commit().unwrap();

        assert_eq!(report.promoted, 1);
        assert_eq!(report.deleted, 1);
        assert!(!target.exists());
    }

    #[test]
    fn delete_of_missing_target_is_fine() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();
        txn.register(PendingResource::Delete(DeleteResource {
            target: dir.path().join("nope"),
        }))
        .unwrap();

        let report = txn.commit().unwrap();
        assert_eq!(report.deleted, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn abort_removes_staged_and_keeps_targets() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("1");
        fs::write(&target, r#"{"keep":1}"#).unwrap();
        let mut txn = create_txn();
        let res = update(&dir, "1", r#"{"drop":1}"#);
        let staged = res.staged.clone();
        txn.update_resource(res).unwrap();
        txn.delete_resource(DeleteResource {
            target: target.clone(),
        })
        .unwrap();

        txn.abort().unwrap();

        assert!(!staged.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), r#"{"keep":1}"#);
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert!(txn.deletes().is_empty());
    }

    #[test]
    fn terminal_states_reject_reuse() {
        let mut txn = create_txn();
        txn.commit().unwrap();
        assert!(txn.commit().is_err());
        assert!(txn.abort().is_err());
        let res = txn.delete_resource(DeleteResource {
            target: Path::new("x").to_path_buf(),
        });
        assert!(matches!(res, Err(CoreError::InvalidOperation { .. })));

        let mut txn = create_txn();
        txn.abort().unwrap();
        assert!(txn.commit().is_err());
        assert!(txn.abort().is_err());
    }

    #[test]
    fn drop_discards_staged_files() {
        let dir = tempdir().unwrap();
        let res = update(&dir, "1", "{}");
        let staged = res.staged.clone();
        {
            let mut txn = create_txn();
            txn.update_resource(res).unwrap();
        }
        assert!(!staged.exists());
    }

    #[test]
    fn pending_lists_updates_first() {
        let dir = tempdir().unwrap();
        let mut txn = create_txn();
        txn.delete_resource(DeleteResource {
            target: dir.path().join("2"),
        })
        .unwrap();
        txn.update_resource(update(&dir, "1", "{}")).unwrap();

        let pending: Vec<_> = txn.pending().collect();
        assert!(matches!(pending[0], PendingResource::Update(_)));
        assert!(matches!(pending[1], PendingResource::Delete(_)));
    }
}
