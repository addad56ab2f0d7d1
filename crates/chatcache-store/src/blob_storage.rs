//! Async key/value persistence for arbitrary-size payloads.
//!
//! [`BlobStorage`] is the only contract the cache layer relies on.  Two
//! backends are provided: [`SqliteBlobStorage`] for real use and
//! [`MemoryBlobStorage`] for tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::database::Database;
use crate::error::{Result, StoreError};

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Load the value stored under `key`, or [`StoreError::NotFound`].
    async fn load(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`.  Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// [`BlobStorage`] backed by the `records` table of a [`Database`].
///
/// SQLite calls are blocking, so each operation runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteBlobStorage {
    db: Arc<Mutex<Database>>,
}

impl SqliteBlobStorage {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open the database at `path` (running migrations) and wrap it.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl BlobStorage for SqliteBlobStorage {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let key = key.to_string();
        self.with_db(move |db| db.get_record(&key)).await
    }

    async fn save(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let owned = key.to_string();
        let len = value.len();
        self.with_db(move |db| db.put_record(&owned, &value)).await?;
        debug!(key, len, "saved record");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let owned = key.to_string();
        let existed = self.with_db(move |db| db.delete_record(&owned)).await?;
        debug!(key, existed, "removed record");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, Vec<u8>>,
    saves: HashMap<String, usize>,
    failing: bool,
}

/// In-process [`BlobStorage`].  Clones share the same map.
///
/// Besides the contract it records how many times each key was saved and can
/// be switched into a failing mode, which is what tests of the cache protocol
/// need to observe.
#[derive(Clone, Default)]
pub struct MemoryBlobStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls for `key`.
    pub fn save_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.saves.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.values.contains_key(key))
            .unwrap_or(false)
    }

    /// When set, every operation fails with an I/O error.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing = failing;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        if inner.failing {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory storage set to fail",
            )));
        }
        Ok(inner)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.lock()?
            .values
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn save(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut inner = self.lock()?;
        inner.values.insert(key.to_string(), value);
        *inner.saves.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(storage: &dyn BlobStorage) {
        assert!(matches!(storage.load("cache").await, Err(StoreError::NotFound)));

        storage.save("cache", b"one".to_vec()).await.unwrap();
        assert_eq!(storage.load("cache").await.unwrap(), b"one");

        storage.save("cache", b"two".to_vec()).await.unwrap();
        assert_eq!(storage.load("cache").await.unwrap(), b"two");

        storage.remove("cache").await.unwrap();
        storage.remove("cache").await.unwrap();
        assert!(matches!(storage.load("cache").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn memory_storage_contract() {
        exercise(&MemoryBlobStorage::new()).await;
    }

    #[tokio::test]
    async fn sqlite_storage_contract() {
        let storage = SqliteBlobStorage::new(Database::open_in_memory().unwrap());
        exercise(&storage).await;
    }

    #[tokio::test]
    async fn sqlite_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let storage = SqliteBlobStorage::open_at(&path).unwrap();
            storage.save("files", b"[]".to_vec()).await.unwrap();
        }

        let reopened = SqliteBlobStorage::open_at(&path).unwrap();
        assert_eq!(reopened.load("files").await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn memory_storage_counts_saves_and_can_fail() {
        let storage = MemoryBlobStorage::new();
        storage.save("cache", vec![1]).await.unwrap();
        storage.save("cache", vec![2]).await.unwrap();
        assert_eq!(storage.save_count("cache"), 2);
        assert_eq!(storage.save_count("files"), 0);

        storage.set_failing(true);
        assert!(matches!(storage.load("cache").await, Err(StoreError::Io(_))));
        assert!(storage.save("cache", vec![3]).await.is_err());

        storage.set_failing(false);
        assert_eq!(storage.load("cache").await.unwrap(), vec![2]);
    }
}
