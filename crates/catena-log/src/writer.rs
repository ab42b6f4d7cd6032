//! Namespace writer.
//!
//! Holds the mutable head chunk and index for one (owner, namespace key).
//! Writes land in the head; when a new name would overflow it, the head is
//! sealed and a fresh head links back to it. Nothing becomes visible until
//! [`flush`](NamespaceWriter::flush) persists head, index and profile and
//! moves the registry pointer. A write or flush that fails leaves the
//! in-memory state exactly as it was before the call.

use alloy_primitives::Address;
use tracing::{debug, info};

use catena_core::validation::{require_identity, validate_namespace_key};
use catena_core::{
    validate_link, Chunk, ContentAddress, Index, Link, LinkBuilder, LinkSigner, Profile,
    SigningKeyWindow, Upsert, DEFAULT_CHUNK_CAPACITY,
};
use catena_store::{BlobStore, NameRegistry, PointerReceipt};

use crate::docs::{load_chunk, load_index, open_profile, store_doc};
use crate::error::{LogError, Result};

/// Configuration for namespace writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Links per chunk before rotation.
    pub chunk_capacity: usize,
    /// Chain id stamped on links built by [`NamespaceWriter::publish`].
    pub chain_id: u64,
}

impl WriterConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            chain_id,
        }
    }

    pub fn with_chunk_capacity(mut self, chunk_capacity: usize) -> Self {
        self.chunk_capacity = chunk_capacity;
        self
    }
}

/// Addresses produced by a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReceipt {
    pub head: ContentAddress,
    pub index: ContentAddress,
    pub profile: ContentAddress,
    pub pointer: PointerReceipt,
}

/// State restored when a write fails part way.
struct Snapshot {
    profile: Profile,
    index: Index,
    head: Chunk,
}

/// Single writer for one namespace.
pub struct NamespaceWriter<B, R> {
    blobs: B,
    registry: R,
    owner: Address,
    key: String,
    config: WriterConfig,
    profile: Profile,
    index: Index,
    head: Chunk,
}

impl<B: BlobStore, R: NameRegistry> NamespaceWriter<B, R> {
    /// Resume from the owner's current registry pointer, or start fresh.
    pub async fn open(
        blobs: B,
        registry: R,
        owner: Address,
        key: impl Into<String>,
        config: WriterConfig,
    ) -> Result<Self> {
        let key = key.into();
        require_identity(&owner)?;
        validate_namespace_key(&key)?;
        if config.chunk_capacity == 0 {
            return Err(LogError::InvalidCapacity(0));
        }

        let profile = open_profile(&blobs, &registry, &owner)
            .await?
            .unwrap_or_default();
        let index = match profile.namespace(&key) {
            Some(address) => load_index(&blobs, &address).await?,
            None => Index::new(),
        };
        let head = match index.head {
            Some(address) => load_chunk(&blobs, &address).await?,
            None => Chunk::new(None),
        };

        debug!(
            owner = %owner,
            key = %key,
            head_links = head.len(),
            indexed = index.len(),
            "opened namespace writer"
        );

        Ok(Self {
            blobs,
            registry,
            owner,
            key,
            config,
            profile,
            index,
            head,
        })
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn head(&self) -> &Chunk {
        &self.head
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Write one link and flush.
    pub async fn write(&mut self, link: Link) -> Result<FlushReceipt> {
        self.write_batch(vec![link]).await
    }

    /// Write many links as if one at a time, then flush once.
    ///
    /// Every link is validated before any I/O; a single invalid link rejects
    /// the whole batch. If any I/O fails, head, index and profile are rolled
    /// back so the batch is not picked up by a later flush.
    pub async fn write_batch(&mut self, links: Vec<Link>) -> Result<FlushReceipt> {
        for link in &links {
            validate_link(link, true)?;
        }
        let saved = self.snapshot();
        let result = self.apply_and_commit(links).await;
        if result.is_err() {
            self.restore(saved);
        }
        result
    }

    /// Build, sign and write one link with a fresh nonce.
    pub async fn publish(
        &mut self,
        name: impl Into<String>,
        content_address: ContentAddress,
        signer: &LinkSigner,
        signed_at: i64,
    ) -> Result<Link> {
        let link = LinkBuilder::new(name, content_address, self.config.chain_id)
            .signed_at(signed_at)
            .sign(signer)?;
        self.write(link.clone()).await?;
        Ok(link)
    }

    /// Add a delegated signing key. Written at the next flush.
    pub fn authorize_signing_key(&mut self, window: SigningKeyWindow) -> Result<()> {
        require_identity(&window.address)?;
        self.profile.add_signing_key(window);
        Ok(())
    }

    /// Persist head, index and profile, then move the registry pointer.
    pub async fn flush(&mut self) -> Result<FlushReceipt> {
        let saved = self.snapshot();
        let result = self.commit().await;
        if result.is_err() {
            self.restore(saved);
        }
        result
    }

    async fn apply_and_commit(&mut self, links: Vec<Link>) -> Result<FlushReceipt> {
        for link in links {
            self.apply(link).await?;
        }
        self.commit().await
    }

    async fn commit(&mut self) -> Result<FlushReceipt> {
        let head = store_doc(&self.blobs, &self.head).await?;
        self.index.record_chunk(&self.head, head);
        self.index.head = Some(head);

        let index = store_doc(&self.blobs, &self.index).await?;
        self.profile.set_namespace(self.key.clone(), index);

        let profile = store_doc(&self.blobs, &self.profile).await?;
        let pointer = self.registry.update_pointer(&self.owner, profile).await?;

        info!(
            owner = %self.owner,
            key = %self.key,
            head = %head,
            index = %index,
            profile = %profile,
            "flushed namespace"
        );

        Ok(FlushReceipt {
            head,
            index,
            profile,
            pointer,
        })
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            profile: self.profile.clone(),
            index: self.index.clone(),
            head: self.head.clone(),
        }
    }

    fn restore(&mut self, saved: Snapshot) {
        debug!(owner = %self.owner, key = %self.key, "rolled back failed write");
        self.profile = saved.profile;
        self.index = saved.index;
        self.head = saved.head;
    }

    async fn apply(&mut self, link: Link) -> Result<()> {
        if !self.head.contains(&link.name) && self.head.len() >= self.config.chunk_capacity {
            self.rotate().await?;
        }
        match self.head.upsert(link) {
            Upsert::Replaced(position) => debug!(position, "replaced link in head"),
            Upsert::Appended(position) => debug!(position, "appended link to head"),
        }
        Ok(())
    }

    /// Seal the head and start a new one after it.
    async fn rotate(&mut self) -> Result<()> {
        let sealed = store_doc(&self.blobs, &self.head).await?;
        self.index.record_chunk(&self.head, sealed);
        info!(
            owner = %self.owner,
            key = %self.key,
            chunk = %sealed,
            links = self.head.len(),
            "sealed chunk"
        );
        self.head = Chunk::new(Some(sealed));
        Ok(())
    }
}
