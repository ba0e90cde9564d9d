//! File-per-entity store.
//!
//! ```text
//! <base>/
//! ├─ user/
//! │  ├─ 1              # {"name":"Alice"}
//! │  └─ 2              # {"name":"Bob"}
//! ├─ post/
//! │  └─ 1
//! └─ user3.k2J9xq.tmp  # staged file of an uncommitted write
//! ```
//!
//! Staged files live directly in the base directory, never inside a kind
//! directory, so listing a kind never sees them.

use crate::alloc::IdAllocator;
use crate::config::Config;
use crate::entity::{Entity, EntityArg, Fields, Key};
use crate::error::{CoreError, CoreResult};
use crate::transaction::{DeleteResource, PathLocks, Transaction, TransactionId, UpdateResource};
use entifs_storage::{FileSystem, OsFileSystem};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Longest `{kind}{id}` prefix, in bytes, put into a staged file name.
///
/// Keeps staged names well under the usual 255-byte file name limit
/// whatever the key length.
const MAX_STAGED_PREFIX: usize = 64;

/// Maps entities onto files under a base directory.
///
/// A `Store` is an explicit value: open as many as needed, each with its
/// own base directory, configuration and filesystem. It is `Send + Sync`
/// and meant to be shared behind an `Arc` by concurrent request handlers.
///
/// Writes are never applied directly. [`Store::store`] and
/// [`Store::remove`] register resources on a [`Transaction`], and only
/// [`Transaction::commit`] touches the entity files. Reads go straight to
/// disk and see committed state only.
pub struct Store {
    base: PathBuf,
    config: Config,
    fs: Arc<dyn FileSystem>,
    allocator: IdAllocator,
    locks: Arc<PathLocks>,
    next_txid: AtomicU64,
}

impl Store {
    /// Opens a store at `path` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DirectoryUnavailable`] if the base directory
    /// cannot be created or is not a directory.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a store at `path` with custom configuration.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        Self::with_file_system(path, config, Arc::new(OsFileSystem::new()))
    }

    /// Opens a store over a specific filesystem implementation.
    ///
    /// # Errors
    ///
    /// See [`Store::open`]. With `create_if_missing` off, a missing base
    /// directory is an error. An empty staged suffix is
    /// [`CoreError::InvalidConfig`], since every file in the base directory
    /// would then look staged.
    pub fn with_file_system(
        path: impl AsRef<Path>,
        config: Config,
        fs: Arc<dyn FileSystem>,
    ) -> CoreResult<Self> {
        let base = path.as_ref().to_path_buf();

        if config.staged_suffix.is_empty() {
            return Err(CoreError::invalid_config(
                "staged file suffix must not be empty",
            ));
        }

        if !fs.exists(&base) {
            if !config.create_if_missing {
                return Err(CoreError::directory_unavailable(&base, "does not exist"));
            }
            fs.create_dir(&base)
                .map_err(|e| CoreError::directory_unavailable(&base, e.to_string()))?;
        }
        if !fs.is_dir(&base) {
            return Err(CoreError::directory_unavailable(&base, "not a directory"));
        }

        info!(base = %base.display(), "opened entity store");
        Ok(Self {
            base,
            config,
            fs,
            allocator: IdAllocator::new(),
            locks: Arc::new(PathLocks::new()),
            next_txid: AtomicU64::new(1),
        })
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the id allocator.
    #[must_use]
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Begins a new transaction bound to this store's filesystem.
    pub fn begin(&self) -> Transaction {
        let id = TransactionId(self.next_txid.fetch_add(1, Ordering::SeqCst));
        Transaction::new(id, Arc::clone(&self.fs), Arc::clone(&self.locks))
    }

    /// Returns the path of an entity file.
    #[must_use]
    pub fn entity_path(&self, key: &Key) -> PathBuf {
        self.base.join(key.kind()).join(key.id())
    }

    /// Stages `entity` for writing in `txn`.
    ///
    /// Creates the kind directory on first use, writes the fields to a new
    /// staged file in the base directory and registers an update. The
    /// entity file itself is left alone until commit.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidOperation`] if `txn` is no longer open
    /// - [`CoreError::DirectoryUnavailable`] if the kind directory can't be created
    /// - [`CoreError::NotWritable`] if the entity file exists and is read-only
    /// - [`CoreError::Storage`] if the staged file can't be written
    pub fn store(&self, entity: &Entity, txn: &mut Transaction) -> CoreResult<()> {
        if !txn.is_open() {
            return Err(CoreError::invalid_operation(
                "cannot stage into a finished transaction",
            ));
        }

        let key = entity.key();
        let dir = self.base.join(key.kind());
        if !self.fs.exists(&dir) {
            self.fs
                .create_dir(&dir)
                .map_err(|e| CoreError::directory_unavailable(&dir, e.to_string()))?;
        }
        if !self.fs.is_dir(&dir) {
            return Err(CoreError::directory_unavailable(&dir, "not a directory"));
        }

        let target = dir.join(key.id());
        if self.fs.exists(&target) {
            match self.fs.is_writable(&target) {
                Ok(true) => {}
                Ok(false) => return Err(CoreError::not_writable(&target)),
                // replaced by a concurrent commit since the existence check
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }

        let body = entity.encode_body()?;
        let prefix = staged_prefix(key);
        let staged = self.fs.create_temp_file(
            &self.base,
            &prefix,
            &self.config.staged_suffix,
            &body,
            self.config.sync_on_stage,
        )?;

        debug!(txn = %txn.id(), key = %key, staged = %staged.display(), "staged entity");
        txn.update_resource(UpdateResource { target, staged })
    }

    /// Loads the entity `kind:id`.
    ///
    /// Returns `None` if no such entity file exists.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidKey`] if `kind` or `id` is malformed
    /// - [`CoreError::NotRegularFile`] if the path exists but is not a file
    /// - [`CoreError::Codec`] or [`CoreError::NotAnObject`] if the content
    ///   is not a JSON object
    pub fn load(&self, kind: &str, id: &str) -> CoreResult<Option<Entity>> {
        self.load_key(Key::new(kind, id)?)
    }

    /// Loads the entity addressed by `key`.
    ///
    /// # Errors
    ///
    /// See [`Store::load`].
    pub fn load_key(&self, key: Key) -> CoreResult<Option<Entity>> {
        let path = self.entity_path(&key);

        if !self.fs.exists(&path) {
            return Ok(None);
        }
        if !self.fs.is_file(&path) {
            return Err(CoreError::not_regular_file(&path));
        }

        let bytes = match self.fs.read(&path) {
            Ok(bytes) => bytes,
            // removed by a commit since the existence check
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(fields) => Ok(Some(Entity::new(key, fields))),
            _ => Err(CoreError::not_an_object(&path)),
        }
    }

    /// Same as [`Store::load`]; the name used by reference resolvers.
    ///
    /// # Errors
    ///
    /// See [`Store::load`].
    pub fn retrieve(&self, kind: &str, id: &str) -> CoreResult<Option<Entity>> {
        self.load(kind, id)
    }

    /// Lists the keys of all entities of `kind` without reading them.
    ///
    /// Hidden entries, non-regular entries and file names that are not
    /// valid ids are skipped. A missing kind directory yields an empty list.
    /// Keys come back in directory listing order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for a malformed kind, or
    /// [`CoreError::Storage`] if the directory can't be listed.
    pub fn retrieve_all(&self, kind: &str) -> CoreResult<Vec<Key>> {
        Key::validate_kind(kind)?;
        let dir = self.base.join(kind);
        if !self.fs.is_dir(&dir) {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for path in self.fs.list_dir(&dir)? {
            if self.fs.is_hidden(&path) || !self.fs.is_file(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if let Ok(key) = Key::new(kind, name) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Registers the removal of `key` in `txn`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `txn` is no longer open.
    pub fn remove(&self, key: &Key, txn: &mut Transaction) -> CoreResult<()> {
        let target = self.entity_path(key);
        debug!(txn = %txn.id(), key = %key, "registered delete");
        txn.delete_resource(DeleteResource { target })
    }

    /// Registers the removal of the entity named by a `kind:id` reference.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if the reference is malformed.
    pub fn remove_reference(&self, reference: &str, txn: &mut Transaction) -> CoreResult<()> {
        let key = Key::decode(reference)?;
        self.remove(&key, txn)
    }

    /// Allocates a fresh id for `kind`.
    ///
    /// The id is the base-36 form of the first candidate, starting at this
    /// kind's cached counter, that has no entity file. Allocation for a kind
    /// is serialized, so concurrent callers in this process never receive
    /// the same id. An id is only guaranteed free until someone else writes
    /// that file; the caller should store under it promptly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] for a malformed kind.
    pub fn generate_id(&self, kind: &str) -> CoreResult<String> {
        Key::validate_kind(kind)?;
        let dir = self.base.join(kind);
        let id = self
            .allocator
            .allocate(kind, |candidate| self.fs.exists(&dir.join(candidate)));
        debug!(kind, id = %id, "allocated id");
        Ok(id)
    }

    /// Allocates a fresh key for `kind`.
    ///
    /// # Errors
    ///
    /// See [`Store::generate_id`].
    pub fn generate_key(&self, kind: &str) -> CoreResult<Key> {
        let id = self.generate_id(kind)?;
        Key::new(kind, id)
    }

    /// Wraps `fields` in a new entity with a freshly allocated key.
    ///
    /// # Errors
    ///
    /// See [`Store::generate_id`].
    pub fn create(&self, kind: &str, fields: Fields) -> CoreResult<Entity> {
        Ok(Entity::new(self.generate_key(kind)?, fields))
    }

    /// Turns any entity argument into an entity.
    ///
    /// References are loaded (and may be missing), entities are returned as
    /// they are, and plain fields become a new entity of `kind`.
    ///
    /// # Errors
    ///
    /// Propagates errors of [`Store::load_key`] and [`Store::create`].
    pub fn resolve(&self, kind: &str, arg: EntityArg) -> CoreResult<Option<Entity>> {
        match arg {
            EntityArg::Reference(key) => self.load_key(key),
            EntityArg::Entity(entity) => Ok(Some(entity)),
            EntityArg::Fields(fields) => self.create(kind, fields).map(Some),
        }
    }

    /// Checks if an entity file exists for `key`.
    #[must_use]
    pub fn exists(&self, key: &Key) -> bool {
        self.fs.is_file(&self.entity_path(key))
    }

    /// Returns the number of entities of `kind`.
    ///
    /// # Errors
    ///
    /// See [`Store::retrieve_all`].
    pub fn count(&self, kind: &str) -> CoreResult<usize> {
        Ok(self.retrieve_all(kind)?.len())
    }

    /// Lists the kinds that have a directory under the base.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the base can't be listed.
    pub fn kinds(&self) -> CoreResult<Vec<String>> {
        let mut kinds = Vec::new();
        for path in self.fs.list_dir(&self.base)? {
            if self.fs.is_hidden(&path) || !self.fs.is_dir(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                if Key::validate_kind(name).is_ok() {
                    kinds.push(name.to_string());
                }
            }
        }
        kinds.sort();
        Ok(kinds)
    }

    /// Lists staged files in the base directory.
    ///
    /// Outside of an in-flight transaction these are leftovers of commits
    /// that could not promote them, or of a crash.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the base can't be listed.
    pub fn staged_files(&self) -> CoreResult<Vec<PathBuf>> {
        let suffix = self.config.staged_suffix.as_str();
        let mut staged = Vec::new();
        for path in self.fs.list_dir(&self.base)? {
            let is_staged = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix));
            if is_staged && self.fs.is_file(&path) {
                staged.push(path);
            }
        }
        staged.sort();
        Ok(staged)
    }

    /// Removes every staged file, returning how many were removed.
    ///
    /// Only call this while no transaction of this store is open: it can't
    /// tell a leftover from a file staged a moment ago.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if a file can't be removed.
    pub fn clean_staged(&self) -> CoreResult<usize> {
        let mut removed = 0;
        for path in self.staged_files()? {
            match self.fs.remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        info!(removed, "removed staged files");
        Ok(removed)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("base", &self.base)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// File name prefix of a staged file for `key`: `{kind}{id}.`, with the
/// `{kind}{id}` part cut to [`MAX_STAGED_PREFIX`] bytes.
fn staged_prefix(key: &Key) -> String {
    let mut name = format!("{}{}", key.kind(), key.id());
    if name.len() > MAX_STAGED_PREFIX {
        let mut end = MAX_STAGED_PREFIX;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name.push('.');
    name
}
