//! SQLite implementation of the blob store.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use catena_core::ContentAddress;

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{check_capacity, BlobStore, DEFAULT_MAX_BLOB_SIZE};

/// SQLite-backed content-addressed blob store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteBlobStore {
    conn: Arc<Mutex<Connection>>,
    max_blob_size: usize,
}

impl SqliteBlobStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        })
    }

    pub fn with_max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Internal(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("spawn_blocking failed: {}", e)))?
    }

    /// Number of stored blobs.
    pub async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn put(&self, bytes: Bytes) -> Result<ContentAddress> {
        check_capacity(bytes.len(), self.max_blob_size)?;
        let address = ContentAddress::digest(&bytes);

        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO blobs (address, bytes, size, stored_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    address.as_bytes().as_slice(),
                    &bytes[..],
                    bytes.len() as i64,
                    now_millis(),
                ],
            )?;
            if inserted == 0 {
                debug!(address = %address, "blob already stored");
            }
            Ok(address)
        })
        .await
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let address = *address;
        self.blocking(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT bytes FROM blobs WHERE address = ?1",
                    params![address.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            let bytes = bytes.ok_or_else(|| StoreError::NotFound(address.to_hex()))?;
            if ContentAddress::digest(&bytes) != address {
                return Err(StoreError::InvalidData(format!(
                    "stored bytes do not hash to {}",
                    address
                )));
            }
            Ok(Bytes::from(bytes))
        })
        .await
    }

    fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = SqliteBlobStore::open_memory().unwrap();
        let addr = store.put(Bytes::from_static(b"chunk bytes")).await.unwrap();
        assert_eq!(store.get(&addr).await.unwrap().as_ref(), b"chunk bytes");
    }

    #[tokio::test]
    async fn test_put_idempotent() {
        let store = SqliteBlobStore::open_memory().unwrap();
        let a = store.put(Bytes::from_static(b"same")).await.unwrap();
        let b = store.put(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let store = SqliteBlobStore::open_memory().unwrap();
        let result = store.get(&ContentAddress::from_bytes([1; 32])).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_capacity_exceeded() {
        let store = SqliteBlobStore::open_memory().unwrap().with_max_blob_size(8);
        let result = store.put(Bytes::from(vec![0u8; 9])).await;
        assert!(matches!(result, Err(StoreError::CapacityExceeded { .. })));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.db");

        let addr = {
            let store = SqliteBlobStore::open(&path).unwrap();
            store.put(Bytes::from_static(b"durable")).await.unwrap()
        };

        let store = SqliteBlobStore::open(&path).unwrap();
        assert_eq!(store.get(&addr).await.unwrap().as_ref(), b"durable");
    }
}
