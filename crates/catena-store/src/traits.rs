//! Collaborator traits: blob store, chain reader and name registry.
//!
//! These are the narrow interfaces the log, verifier and aggregator consume.
//! Implementations include in-memory (tests), SQLite (blobs) and whatever
//! network clients the embedding application provides.

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use bytes::Bytes;

use catena_core::ContentAddress;

use crate::error::Result;

/// Default maximum blob size (8 MiB).
pub const DEFAULT_MAX_BLOB_SIZE: usize = 8 * 1024 * 1024;

/// Outcome of a read-only contract call.
///
/// A revert is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    pub reverted: bool,
    pub return_data: Bytes,
}

impl CallOutcome {
    pub fn success(return_data: impl Into<Bytes>) -> Self {
        Self {
            reverted: false,
            return_data: return_data.into(),
        }
    }

    pub fn revert() -> Self {
        Self {
            reverted: true,
            return_data: Bytes::new(),
        }
    }
}

/// Confirmation of a registry pointer update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerReceipt {
    pub avatar: Address,
    pub pointer: ContentAddress,
    /// Monotonic per-registry update counter.
    pub sequence: u64,
}

/// Content-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning their content address.
    ///
    /// Fails with `CapacityExceeded` when the blob is larger than
    /// [`max_blob_size`](Self::max_blob_size).
    async fn put(&self, bytes: Bytes) -> Result<ContentAddress>;

    /// Fetch the bytes stored at an address.
    async fn get(&self, address: &ContentAddress) -> Result<Bytes>;

    /// Largest blob this store accepts.
    fn max_blob_size(&self) -> usize {
        DEFAULT_MAX_BLOB_SIZE
    }
}

/// Read-only access to chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed code at an address (empty for plain-key accounts).
    async fn get_code(&self, address: &Address) -> Result<Bytes>;

    /// Execute a read-only call.
    async fn call(&self, address: &Address, data: Bytes) -> Result<CallOutcome>;
}

/// Registry mapping each avatar to its current profile address.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    async fn get_pointer(&self, avatar: &Address) -> Result<Option<ContentAddress>>;

    async fn update_pointer(
        &self,
        avatar: &Address,
        pointer: ContentAddress,
    ) -> Result<PointerReceipt>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared-ownership forwarding
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(&self, bytes: Bytes) -> Result<ContentAddress> {
        (**self).put(bytes).await
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        (**self).get(address).await
    }

    fn max_blob_size(&self) -> usize {
        (**self).max_blob_size()
    }
}

#[async_trait]
impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    async fn get_code(&self, address: &Address) -> Result<Bytes> {
        (**self).get_code(address).await
    }

    async fn call(&self, address: &Address, data: Bytes) -> Result<CallOutcome> {
        (**self).call(address, data).await
    }
}

#[async_trait]
impl<T: NameRegistry + ?Sized> NameRegistry for Arc<T> {
    async fn get_pointer(&self, avatar: &Address) -> Result<Option<ContentAddress>> {
        (**self).get_pointer(avatar).await
    }

    async fn update_pointer(
        &self,
        avatar: &Address,
        pointer: ContentAddress,
    ) -> Result<PointerReceipt> {
        (**self).update_pointer(avatar, pointer).await
    }
}

/// Reject blobs over `max`.
pub(crate) fn check_capacity(size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(crate::error::StoreError::CapacityExceeded { size, max });
    }
    Ok(())
}
