//! The [`StorageBackend`] trait and its filesystem implementation.
//!
//! A backend supplies the four file capabilities the store relies on.
//! Existence checks and reads are synchronous because they only happen
//! while loading; writes and removals are async and may suspend on I/O.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// File capabilities consumed by a [`Store`](crate::Store).
///
/// All failures surface as [`StoreError::Io`](crate::StoreError::Io) and
/// are propagated unmodified: no retries, no recovery.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> StoreResult<bool>;

    /// Read the whole file at `path`.
    fn read(&self, path: &Path) -> StoreResult<Vec<u8>>;

    /// Replace the contents of `path` wholesale, creating it if needed.
    async fn write(&self, path: &Path, bytes: Vec<u8>) -> StoreResult<()>;

    /// Remove the file at `path`.
    async fn remove(&self, path: &Path) -> StoreResult<()>;
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn exists(&self, path: &Path) -> StoreResult<bool> {
        (**self).exists(path)
    }

    fn read(&self, path: &Path) -> StoreResult<Vec<u8>> {
        (**self).read(path)
    }

    async fn write(&self, path: &Path, bytes: Vec<u8>) -> StoreResult<()> {
        (**self).write(path, bytes).await
    }

    async fn remove(&self, path: &Path) -> StoreResult<()> {
        (**self).remove(path).await
    }
}

/// Remove the store file at `path`, failing with
/// [`StoreError::StoreNotFound`] if it does not exist.
///
/// The file is never read, so a corrupt store can always be deleted.
pub async fn remove_store_file<B>(backend: &B, path: &Path) -> StoreResult<()>
where
    B: StorageBackend + ?Sized,
{
    if !backend.exists(path)? {
        return Err(StoreError::StoreNotFound(path.to_path_buf()));
    }
    backend.remove(path).await?;
    info!(path = %path.display(), "store file deleted");
    Ok(())
}

/// Backend over the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsBackend;

#[async_trait]
impl StorageBackend for FsBackend {
    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(path.try_exists()?)
    }

    fn read(&self, path: &Path) -> StoreResult<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    async fn write(&self, path: &Path, bytes: Vec<u8>) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let len = bytes.len();
        tokio::fs::write(path, bytes).await?;
        debug!(path = %path.display(), len, "store file written");
        Ok(())
    }

    async fn remove(&self, path: &Path) -> StoreResult<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
