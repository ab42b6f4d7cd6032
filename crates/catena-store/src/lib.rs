//! # Catena Store
//!
//! Collaborator interfaces for Catena and reference implementations of them.
//!
//! ## Overview
//!
//! The log, verifier and aggregator never talk to a backend directly. They
//! consume three narrow traits:
//!
//! - [`BlobStore`] - content-addressed `put`/`get` with a size cap
//! - [`ChainReader`] - `get_code` and read-only `call`
//! - [`NameRegistry`] - one pointer per avatar
//!
//! ## Implementations
//!
//! - [`MemoryBlobStore`], [`MemoryChain`], [`MemoryRegistry`] - in-memory, for tests
//! - [`SqliteBlobStore`] - SQLite-based persistent blobs
//! - [`CoalescingBlobStore`] - wraps any blob store to share concurrent fetches
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use catena_store::{BlobStore, SqliteBlobStore};
//!
//! async fn example() {
//!     let store = SqliteBlobStore::open("blobs.db").unwrap();
//!     let address = store.put(Bytes::from_static(b"hello")).await.unwrap();
//!     let bytes = store.get(&address).await.unwrap();
//!     assert_eq!(bytes.as_ref(), b"hello");
//! }
//! ```

pub mod abi;
pub mod coalesce;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use coalesce::CoalescingBlobStore;
pub use error::{Result, StoreError};
pub use memory::{ConventionSupport, MemoryBlobStore, MemoryChain, MemoryRegistry, WalletContract};
pub use sqlite::SqliteBlobStore;
pub use traits::{
    BlobStore, CallOutcome, ChainReader, NameRegistry, PointerReceipt, DEFAULT_MAX_BLOB_SIZE,
};

/// Configuration for blob storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Largest blob accepted by `put`.
    pub max_blob_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        }
    }
}
