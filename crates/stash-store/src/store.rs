use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use stash_hash::ContentHasher;
use tracing::{debug, info};

use crate::backend::{remove_store_file, FsBackend, StorageBackend};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::record::{encode_record, PersistedRecord};
use crate::subscription::{Subscriber, SubscriptionRegistry};

/// File-backed key-value store with an in-memory cache.
///
/// The persisted record is loaded once when the store is opened. Reads and
/// writes of values then only touch the cache; [`Store::write`] persists it
/// when the cache hash has moved away from the hash last seen on disk.
///
/// Two hashes gate disk I/O:
/// - the *cache hash*, recomputed after every [`Store::set`];
/// - the *last-known hash*, taken from the most recently loaded or written
///   record.
///
/// All mutating operations take `&mut self`, so a single `Store` can never
/// run two gate-then-write sequences at once. Share it between tasks
/// behind a `tokio::sync::Mutex`.
pub struct Store<T, B = FsBackend> {
    path: PathBuf,
    backend: B,
    cache: BTreeMap<String, T>,
    cache_hash: String,
    last_known_hash: String,
    subscriptions: SubscriptionRegistry<T>,
}

impl<T> Store<T, FsBackend>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the store at the path `config` resolves to.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::open_at(config.resolve_path()?)
    }

    /// Open the store at an explicit file path.
    pub fn open_at(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_backend(path, FsBackend)
    }
}

impl<T, B> Store<T, B>
where
    T: Serialize + DeserializeOwned + Clone,
    B: StorageBackend,
{
    /// Create a store over `backend` and load whatever is persisted at
    /// `path`. A missing file yields an empty store; a corrupt one fails.
    pub fn with_backend(path: impl Into<PathBuf>, backend: B) -> StoreResult<Self> {
        let mut store = Self {
            path: path.into(),
            backend,
            cache: BTreeMap::new(),
            cache_hash: String::new(),
            last_known_hash: String::new(),
            subscriptions: SubscriptionRegistry::new(),
        };
        store.load(false)?;
        info!(path = %store.path.display(), keys = store.cache.len(), "store opened");
        Ok(store)
    }

    // ---- Persistence gate ----

    /// Reload from the store's own path. See [`Store::load_from`].
    pub fn load(&mut self, force: bool) -> StoreResult<()> {
        let path = self.path.clone();
        self.load_from(&path, force)
    }

    /// Replace the cache with the record persisted at `path`.
    ///
    /// Does nothing if the file does not exist. Unless `force` is set, a
    /// record whose hash equals the current cache hash is ignored, even if
    /// its data differs. Subscribers are not notified of reloaded values.
    pub fn load_from(&mut self, path: &Path, force: bool) -> StoreResult<()> {
        if !self.backend.exists(path)? {
            debug!(path = %path.display(), "no store file; starting empty");
            return Ok(());
        }
        let bytes = self.backend.read(path)?;
        let record: PersistedRecord<T> = PersistedRecord::decode(&bytes, path)?;

        if !force && record.hash == self.cache_hash {
            debug!(path = %path.display(), hash = %record.hash, "load skipped: hash unchanged");
            return Ok(());
        }

        debug!(
            path = %path.display(),
            hash = %record.hash,
            keys = record.data.len(),
            "load accepted"
        );
        self.cache = record.data;
        self.cache_hash.clone_from(&record.hash);
        self.last_known_hash = record.hash;
        Ok(())
    }

    /// Persist the cache to the store's own path. See [`Store::write_to`].
    pub async fn write(&mut self, force: bool) -> StoreResult<()> {
        let path = self.path.clone();
        self.write_to(&path, force).await
    }

    /// Persist the cache to `path` as `{ "_hash", "data" }`.
    ///
    /// Unless `force` is set, nothing is written when the cache hash equals
    /// the last-known hash. The last-known hash is only advanced once the
    /// backend reports success.
    pub async fn write_to(&mut self, path: &Path, force: bool) -> StoreResult<()> {
        if !force && self.last_known_hash == self.cache_hash {
            debug!(
                path = %path.display(),
                hash = %self.cache_hash,
                "write skipped: nothing changed"
            );
            return Ok(());
        }
        let bytes = encode_record(&self.cache_hash, &self.cache)?;
        self.backend.write(path, bytes).await?;
        self.last_known_hash.clone_from(&self.cache_hash);
        debug!(
            path = %path.display(),
            hash = %self.cache_hash,
            keys = self.cache.len(),
            "store written"
        );
        Ok(())
    }

    /// Delete the persisted file at the store's own path.
    pub async fn delete_store(&self) -> StoreResult<()> {
        self.delete_store_at(&self.path).await
    }

    /// Delete the persisted file at `path`.
    ///
    /// The cache and both hashes are left untouched, so a forced write, or
    /// any write after a `set`, recreates the file.
    pub async fn delete_store_at(&self, path: &Path) -> StoreResult<()> {
        remove_store_file(&self.backend, path).await
    }

    // ---- Data access ----

    /// Current cached value for `key`.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.cache.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Assign `value` to `key`, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: T) -> StoreResult<()> {
        self.set_with(key, value, true)
    }

    /// Assign `value` to `key`.
    ///
    /// With `overwrite == false` an existing key keeps its value and
    /// nothing else happens. Otherwise the value is stored, the cache hash
    /// is recomputed, and the key's subscribers are called in registration
    /// order.
    ///
    /// If the cache cannot be hashed the previous value is restored and the
    /// error is returned; subscribers are not called. A panicking subscriber
    /// unwinds out of this call after the value and hash have been updated,
    /// and the subscribers after it are skipped.
    pub fn set_with(
        &mut self,
        key: impl Into<String>,
        value: T,
        overwrite: bool,
    ) -> StoreResult<()> {
        let key = key.into();
        if !overwrite && self.cache.contains_key(&key) {
            return Ok(());
        }
        let previous = self.cache.insert(key.clone(), value);
        let digest = match ContentHasher::CACHE.hash_json(&self.cache) {
            Ok(digest) => digest,
            Err(e) => {
                match previous {
                    Some(old) => self.cache.insert(key, old),
                    None => self.cache.remove(&key),
                };
                return Err(e.into());
            }
        };
        self.cache_hash = digest.to_hex();

        let notified = self.subscriptions.notify(&key, self.cache.get(&key));
        if notified > 0 {
            debug!(key = %key, notified, "subscribers notified");
        }
        Ok(())
    }

    // ---- Subscriptions ----

    /// Register `callback` under `key`, call it once with the key's current
    /// value, and return that value.
    pub fn on(&mut self, key: &str, callback: Subscriber<T>) -> Option<T> {
        self.subscriptions.subscribe(key, callback.clone());
        let current = self.cache.get(key);
        callback(current);
        current.cloned()
    }

    /// Remove the first registration of `callback` under `key`.
    pub fn off(&mut self, key: &str, callback: &Subscriber<T>) -> StoreResult<()> {
        self.subscriptions.unsubscribe(key, callback)
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.subscriptions.count(key)
    }

    // ---- Introspection ----

    /// Path the store loads from and writes to by default.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cached keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cache.keys().map(String::as_str)
    }

    /// Full cache contents.
    pub fn entries(&self) -> &BTreeMap<String, T> {
        &self.cache
    }

    /// Hash of the current cache, or `""` before the first change.
    pub fn cache_hash(&self) -> &str {
        &self.cache_hash
    }

    /// Hash of the most recently loaded or written record.
    pub fn last_known_hash(&self) -> &str {
        &self.last_known_hash
    }

    /// Whether a non-forced [`Store::write`] would touch the disk.
    pub fn is_dirty(&self) -> bool {
        self.cache_hash != self.last_known_hash
    }
}

impl<T, B: std::fmt::Debug> std::fmt::Debug for Store<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("keys", &self.cache.len())
            .field("cache_hash", &self.cache_hash)
            .field("last_known_hash", &self.last_known_hash)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
