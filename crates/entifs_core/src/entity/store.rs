//! Auto-commit entity operations.

use crate::entity::{Entity, EntityArg, Fields, Key};
use crate::error::CoreResult;
use crate::query::ListOptions;
use crate::store::Store;
use crate::transaction::Transaction;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Provides entity-level operations on a [`Store`].
///
/// The `EntityStore` is a thin convenience layer. Each write method takes
/// an optional transaction: with one, the operation is staged into it and
/// the caller commits; without one, a transaction is opened, the single
/// store operation is staged, and the transaction is committed before
/// returning.
#[derive(Debug, Clone)]
pub struct EntityStore {
    store: Arc<Store>,
}

impl EntityStore {
    /// Creates an entity store over an existing store.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Opens a store at `path` with default configuration.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Ok(Self::new(Arc::new(Store::open(path)?)))
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction {
        self.store.begin()
    }

    /// Saves an entity.
    ///
    /// Commit warnings are logged by the commit, not returned.
    pub fn save(&self, entity: &Entity, txn: Option<&mut Transaction>) -> CoreResult<()> {
        self.with_txn(txn, |txn| self.store.store(entity, txn))
    }

    /// Merges `props` into the entity's fields and saves it.
    pub fn update(
        &self,
        entity: &mut Entity,
        props: Fields,
        txn: Option<&mut Transaction>,
    ) -> CoreResult<()> {
        entity.merge(props);
        self.save(entity, txn)
    }

    /// Removes the entity at `key`.
    pub fn remove(&self, key: &Key, txn: Option<&mut Transaction>) -> CoreResult<()> {
        self.with_txn(txn, |txn| self.store.remove(key, txn))
    }

    /// Removes the entity named by a `kind:id` reference.
    pub fn remove_reference(
        &self,
        reference: &str,
        txn: Option<&mut Transaction>,
    ) -> CoreResult<()> {
        self.with_txn(txn, |txn| self.store.remove_reference(reference, txn))
    }

    /// Gets an entity by kind and id.
    pub fn get(&self, kind: &str, id: &str) -> CoreResult<Option<Entity>> {
        self.store.load(kind, id)
    }

    /// Returns references to every entity of `kind`.
    pub fn all(&self, kind: &str) -> CoreResult<Vec<Key>> {
        self.store.retrieve_all(kind)
    }

    /// Loads every entity of `kind` and applies `options`.
    ///
    /// Entities removed between listing and loading are skipped.
    pub fn list(&self, kind: &str, options: &ListOptions) -> CoreResult<Vec<Entity>> {
        let mut entities = Vec::new();
        for key in self.store.retrieve_all(kind)? {
            if let Some(entity) = self.store.load_key(key)? {
                entities.push(entity);
            }
        }
        Ok(options.apply(entities))
    }

    /// Wraps `fields` in a new entity of `kind` with a fresh key.
    ///
    /// The entity is not saved.
    pub fn create(&self, kind: &str, fields: Fields) -> CoreResult<Entity> {
        self.store.create(kind, fields)
    }

    /// Turns an entity argument into an entity. See [`Store::resolve`].
    pub fn resolve(&self, kind: &str, arg: EntityArg) -> CoreResult<Option<Entity>> {
        self.store.resolve(kind, arg)
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is aborted.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction) -> CoreResult<T>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(result) => {
                txn.commit()?;
                Ok(result)
            }
            Err(e) => {
                // Try to abort, but don't mask the original error
                let _ = txn.abort();
                Err(e)
            }
        }
    }

    fn with_txn<T>(
        &self,
        txn: Option<&mut Transaction>,
        op: impl FnOnce(&mut Transaction) -> CoreResult<T>,
    ) -> CoreResult<T> {
        match txn {
            Some(txn) => op(txn),
            None => {
                let mut txn = self.begin();
                debug!(txn = %txn.id(), "auto-commit");
                let result = op(&mut txn)?;
                txn.commit()?;
                Ok(result)
            }
        }
    }
}
