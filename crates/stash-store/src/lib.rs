//! File-backed key-value store with hash-gated persistence.
//!
//! A [`Store`] keeps its values in an in-memory cache and persists the
//! whole cache as a single JSON record:
//!
//! ```text
//! { "_hash": "<hex digest of data>", "data": { "<key>": <value>, ... } }
//! ```
//!
//! # Components
//!
//! - **Cache** -- `BTreeMap<String, T>` behind [`Store::get`], [`Store::set`]
//!   and [`Store::contains`].
//! - **Persistence gate** -- compares the cache hash with the hash last
//!   seen on disk so [`Store::write`] and [`Store::load`] only do I/O when
//!   something changed.
//! - **Subscriptions** -- [`SubscriptionRegistry`] holds per-key callbacks
//!   that fire synchronously, in registration order, on every `set` and once
//!   immediately on [`Store::on`].
//!
//! # Storage Backends
//!
//! All file access goes through the [`StorageBackend`] trait:
//!
//! - [`FsBackend`] -- the local filesystem
//! - [`InMemoryBackend`] -- `HashMap`-based backend with I/O counters, for
//!   tests and embedding
//!
//! # Design Rules
//!
//! 1. A missing store file is a cold start, not an error.
//! 2. A store file that exists but cannot be decoded fails loudly.
//! 3. The hash is XXH3-128 and is used for change detection only.
//! 4. All I/O errors are propagated, never retried or swallowed.
//! 5. Single owner: mutation takes `&mut self`.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod store;
pub mod subscription;

pub use backend::{remove_store_file, FsBackend, StorageBackend};
pub use config::{StoreConfig, DEFAULT_FILE_NAME};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use record::PersistedRecord;
pub use store::Store;
pub use subscription::{subscriber, Subscriber, SubscriptionRegistry};
