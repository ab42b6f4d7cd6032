//! In-memory implementations of the collaborator traits.
//!
//! These are primarily for testing. They have the same semantics as real
//! backends but keep everything in memory with no persistence. The chain
//! double can host programmable contract wallets that answer both
//! verification conventions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use bytes::Bytes;

use catena_core::{wallet_message_hash, ContentAddress, RecoverableSignature};

use crate::abi::{encode_magic, IERC1271, IERC1271Bytes, MAGIC_HASH32, MAGIC_RAW_BYTES};
use crate::error::{Result, StoreError};
use crate::traits::{check_capacity, BlobStore, CallOutcome, ChainReader, NameRegistry, PointerReceipt, DEFAULT_MAX_BLOB_SIZE};

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Internal(format!("lock poisoned: {}", e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Blob store
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory blob store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<ContentAddress, Bytes>>,
    max_blob_size: usize,
    latency: Option<Duration>,
    gets: AtomicUsize,
}

impl MemoryBlobStore {
    /// Create a new empty store with the default size cap.
    pub fn new() -> Self {
        Self::with_max_blob_size(DEFAULT_MAX_BLOB_SIZE)
    }

    pub fn with_max_blob_size(max_blob_size: usize) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            max_blob_size,
            latency: None,
            gets: AtomicUsize::new(0),
        }
    }

    /// Delay every `get` by `latency`, to let concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `get` calls that reached this store.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the bytes at an address without rehashing.
    ///
    /// Only useful for simulating a corrupted or lying backend.
    pub fn corrupt(&self, address: ContentAddress, bytes: impl Into<Bytes>) -> Result<()> {
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(address, bytes.into());
        Ok(())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Bytes) -> Result<ContentAddress> {
        check_capacity(bytes.len(), self.max_blob_size)?;
        let address = ContentAddress::digest(&bytes);
        self.blobs.write().map_err(poisoned)?.insert(address, bytes);
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.blobs
            .read()
            .map_err(poisoned)?
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_hex()))
    }

    fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chain
// ─────────────────────────────────────────────────────────────────────────────

/// How a wallet answers one verification convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConventionSupport {
    /// Checks the signature and returns the magic value when valid.
    Supported,
    /// Reverts on every call.
    Reverts,
    /// Succeeds with empty return data.
    Empty,
    /// The call fails at the transport level.
    Unreachable,
}

/// A programmable contract wallet owned by a single key.
#[derive(Debug, Clone)]
pub struct WalletContract {
    pub owner: Address,
    pub chain_id: u64,
    pub hash32: ConventionSupport,
    pub raw_bytes: ConventionSupport,
}

impl WalletContract {
    /// A wallet answering both conventions.
    pub fn new(owner: Address, chain_id: u64) -> Self {
        Self {
            owner,
            chain_id,
            hash32: ConventionSupport::Supported,
            raw_bytes: ConventionSupport::Supported,
        }
    }

    pub fn hash32(mut self, support: ConventionSupport) -> Self {
        self.hash32 = support;
        self
    }

    pub fn raw_bytes(mut self, support: ConventionSupport) -> Self {
        self.raw_bytes = support;
        self
    }

    /// Whether `signature` is the owner's signature over the wallet-bound
    /// derivation of `payload_hash`.
    fn accepts(&self, wallet: &Address, payload_hash: &B256, signature: &[u8]) -> bool {
        let Ok(sig) = RecoverableSignature::from_slice(signature) else {
            return false;
        };
        if !sig.is_low_s() {
            return false;
        }
        let derived = wallet_message_hash(payload_hash, self.chain_id, wallet);
        sig.recover_address(&derived).map_or(false, |a| a == self.owner)
    }

    fn answer(
        &self,
        support: ConventionSupport,
        magic: [u8; 4],
        valid: impl FnOnce() -> Option<bool>,
    ) -> Result<CallOutcome> {
        match support {
            ConventionSupport::Reverts => Ok(CallOutcome::revert()),
            ConventionSupport::Empty => Ok(CallOutcome::success(Bytes::new())),
            ConventionSupport::Unreachable => {
                Err(StoreError::Transport("wallet endpoint unreachable".into()))
            }
            ConventionSupport::Supported => match valid() {
                None => Ok(CallOutcome::revert()),
                Some(true) => Ok(CallOutcome::success(encode_magic(magic))),
                Some(false) => Ok(CallOutcome::success(encode_magic([0xff; 4]))),
            },
        }
    }
}

/// Placeholder bytecode marking an address as a contract.
const WALLET_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

struct ChainInner {
    code: HashMap<Address, Bytes>,
    wallets: HashMap<Address, WalletContract>,
}

/// In-memory chain with programmable contract wallets.
pub struct MemoryChain {
    inner: RwLock<ChainInner>,
    code_lookups: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ChainInner {
                code: HashMap::new(),
                wallets: HashMap::new(),
            }),
            code_lookups: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Deploy a wallet at `address`.
    pub fn deploy_wallet(&self, address: Address, wallet: WalletContract) -> Result<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.code.insert(address, Bytes::from_static(WALLET_CODE));
        inner.wallets.insert(address, wallet);
        Ok(())
    }

    /// Set raw code at an address without wallet behavior.
    pub fn set_code(&self, address: Address, code: impl Into<Bytes>) -> Result<()> {
        self.inner
            .write()
            .map_err(poisoned)?
            .code
            .insert(address, code.into());
        Ok(())
    }

    /// Number of `get_code` calls served.
    pub fn code_lookups(&self) -> usize {
        self.code_lookups.load(Ordering::SeqCst)
    }

    /// Number of `call`s served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainReader for MemoryChain {
    async fn get_code(&self, address: &Address) -> Result<Bytes> {
        self.code_lookups.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.code.get(address).cloned().unwrap_or_default())
    }

    async fn call(&self, address: &Address, data: Bytes) -> Result<CallOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let wallet = self
            .inner
            .read()
            .map_err(poisoned)?
            .wallets
            .get(address)
            .cloned();

        // Calling an account without code succeeds with no data
        let Some(wallet) = wallet else {
            return Ok(CallOutcome::success(Bytes::new()));
        };

        if data.len() < 4 {
            return Ok(CallOutcome::revert());
        }

        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];
        if selector == MAGIC_HASH32 {
            wallet.answer(wallet.hash32, MAGIC_HASH32, || {
                let call = IERC1271::isValidSignatureCall::abi_decode(&data, true).ok()?;
                Some(wallet.accepts(address, &call.hash, &call.signature))
            })
        } else if selector == MAGIC_RAW_BYTES {
            wallet.answer(wallet.raw_bytes, MAGIC_RAW_BYTES, || {
                let call = IERC1271Bytes::isValidSignatureCall::abi_decode(&data, true).ok()?;
                Some(wallet.accepts(address, &keccak256(&call.data), &call.signature))
            })
        } else {
            Ok(CallOutcome::revert())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory name registry.
pub struct MemoryRegistry {
    pointers: RwLock<HashMap<Address, ContentAddress>>,
    sequence: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            pointers: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameRegistry for MemoryRegistry {
    async fn get_pointer(&self, avatar: &Address) -> Result<Option<ContentAddress>> {
        Ok(self.pointers.read().map_err(poisoned)?.get(avatar).copied())
    }

    async fn update_pointer(
        &self,
        avatar: &Address,
        pointer: ContentAddress,
    ) -> Result<PointerReceipt> {
        self.pointers
            .write()
            .map_err(poisoned)?
            .insert(*avatar, pointer);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PointerReceipt {
            avatar: *avatar,
            pointer,
            sequence,
        })
    }
}
