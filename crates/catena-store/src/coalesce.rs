//! Fetch coalescing for blob stores.
//!
//! Concurrent `get`s for the same address share one backend fetch. Each
//! in-flight address has a reference-counted gate; the first caller to take
//! the gate's lock fetches, later callers find the result already filled in.
//! The gate is removed when its last holder drops it, including holders whose
//! future is cancelled while waiting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use catena_core::ContentAddress;

use crate::error::Result;
use crate::traits::BlobStore;

struct Gate {
    refs: AtomicUsize,
    slot: Mutex<Option<Bytes>>,
}

impl Gate {
    fn new() -> Self {
        Self {
            refs: AtomicUsize::new(0),
            slot: Mutex::new(None),
        }
    }
}

/// Releases one reference on drop and removes the gate at zero.
struct GateGuard<'a> {
    gates: &'a DashMap<ContentAddress, Arc<Gate>>,
    address: ContentAddress,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        // remove_if runs under the shard lock, so no new holder can join
        // between the decrement and the removal.
        self.gates
            .remove_if(&self.address, |_, gate| gate.refs.fetch_sub(1, Ordering::SeqCst) == 1);
    }
}

/// A blob store wrapper that coalesces concurrent fetches.
pub struct CoalescingBlobStore<B> {
    inner: B,
    gates: DashMap<ContentAddress, Arc<Gate>>,
}

impl<B: BlobStore> CoalescingBlobStore<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            gates: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of addresses with an in-flight fetch.
    pub fn in_flight(&self) -> usize {
        self.gates.len()
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for CoalescingBlobStore<B> {
    async fn put(&self, bytes: Bytes) -> Result<ContentAddress> {
        self.inner.put(bytes).await
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let gate = {
            let entry = self
                .gates
                .entry(*address)
                .or_insert_with(|| Arc::new(Gate::new()));
            entry.refs.fetch_add(1, Ordering::SeqCst);
            entry.value().clone()
        };
        let _guard = GateGuard {
            gates: &self.gates,
            address: *address,
        };

        let mut slot = gate.slot.lock().await;
        if let Some(bytes) = slot.as_ref() {
            debug!(address = %address, "coalesced blob fetch");
            return Ok(bytes.clone());
        }

        // Failures are not cached; the next waiter retries.
        let bytes = self.inner.get(address).await?;
        *slot = Some(bytes.clone());
        Ok(bytes)
    }

    fn max_blob_size(&self) -> usize {
        self.inner.max_blob_size()
    }
}
