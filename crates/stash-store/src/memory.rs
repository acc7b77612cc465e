use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::backend::StorageBackend;
use crate::error::StoreResult;

/// In-memory, HashMap-based storage backend.
///
/// Intended for tests and embedding. Files live in a `HashMap` behind a
/// `RwLock`, and every read, write and removal is counted so callers can
/// assert how much I/O a sequence of store operations actually performed.
pub struct InMemoryBackend {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    removes: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }

    /// Seed a file without touching the counters.
    pub fn insert_raw(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.into(), bytes.into());
    }

    /// Current contents of a file, without touching the counters.
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().expect("lock poisoned").get(path).cloned()
    }

    /// Number of completed `read` calls.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of completed `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of completed `remove` calls.
    pub fn remove_count(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Number of files currently held.
    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(self.files.read().expect("lock poisoned").contains_key(path))
    }

    fn read(&self, path: &Path) -> StoreResult<Vec<u8>> {
        let files = self.files.read().expect("lock poisoned");
        let bytes = files.get(path).cloned().ok_or_else(|| not_found(path))?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(bytes)
    }

    async fn write(&self, path: &Path, bytes: Vec<u8>) -> StoreResult<()> {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.to_path_buf(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, path: &Path) -> StoreResult<()> {
        self.files
            .write()
            .expect("lock poisoned")
            .remove(path)
            .ok_or_else(|| not_found(path))?;
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("file_count", &self.len())
            .field("writes", &self.write_count())
            .finish()
    }
}
