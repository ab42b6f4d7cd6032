//! Namespace reader and verified link cursor.

use std::collections::VecDeque;

use alloy_primitives::Address;
use futures::stream::{self, Stream};
use tracing::debug;

use catena_core::{CancellationToken, ContentAddress, Index, Link};
use catena_store::{BlobStore, ChainReader, NameRegistry};
use catena_verify::{NonceRegistry, ReplayScope, SignatureVerifier};

use crate::docs::{load_chunk, open_index};
use crate::error::{LogError, Result};
use crate::walk::{ChunkWalker, DEFAULT_MAX_CHUNKS};

/// A link accepted by the cursor, with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorItem {
    pub link: Link,
    /// Position inside its chunk.
    pub position: usize,
    /// Address of the chunk holding it.
    pub chunk: ContentAddress,
}

/// Read side of a namespace.
pub struct NamespaceReader<'a, B: ?Sized, C> {
    blobs: &'a B,
    verifier: &'a SignatureVerifier<C>,
    max_chunks: usize,
}

impl<'a, B: BlobStore + ?Sized, C: ChainReader> NamespaceReader<'a, B, C> {
    pub fn new(blobs: &'a B, verifier: &'a SignatureVerifier<C>) -> Self {
        Self {
            blobs,
            verifier,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Verified newest-to-oldest cursor from `head`.
    ///
    /// Replay is tracked in `nonces` under (owner, operator, signer).
    pub fn cursor(
        &self,
        owner: Address,
        operator: impl Into<String>,
        head: Option<ContentAddress>,
        nonces: &'a NonceRegistry,
    ) -> LinkCursor<'a, B, C> {
        LinkCursor {
            walker: ChunkWalker::new(self.blobs, head).with_max_chunks(self.max_chunks),
            verifier: self.verifier,
            nonces,
            owner,
            operator: operator.into(),
            pending: VecDeque::new(),
        }
    }

    /// First link in the cursor whose name matches, ignoring case.
    pub async fn latest_by_name(
        &self,
        owner: Address,
        operator: &str,
        head: Option<ContentAddress>,
        nonces: &'a NonceRegistry,
        name: &str,
    ) -> Result<Option<Link>> {
        let mut cursor = self.cursor(owner, operator, head, nonces);
        while let Some(item) = cursor.next().await? {
            if item.link.name_matches(name) {
                return Ok(Some(item.link));
            }
        }
        Ok(None)
    }

    /// Random access through the index. Not signature-checked.
    pub async fn resolve(&self, index: &Index, name: &str) -> Result<Option<Link>> {
        let Some(address) = index.resolve(name) else {
            return Ok(None);
        };
        let chunk = load_chunk(self.blobs, &address).await?;
        let found = match chunk.position(name) {
            Some(position) => chunk.links.into_iter().nth(position),
            None => chunk.links.into_iter().find(|link| link.name_matches(name)),
        };
        Ok(found)
    }

    /// Registry pointer to profile to index for `key`.
    pub async fn open_index<R: NameRegistry + ?Sized>(
        &self,
        registry: &R,
        owner: &Address,
        key: &str,
    ) -> Result<Option<Index>> {
        open_index(self.blobs, registry, owner, key).await
    }
}

/// Lazy, restartable stream of verified links.
///
/// Within a chunk links come out by `signed_at` descending, then position
/// descending. Replayed nonces and bad signatures are skipped without error.
/// Cancellation is observed before each chunk fetch and before each link is
/// verified.
pub struct LinkCursor<'a, B: ?Sized, C> {
    walker: ChunkWalker<'a, B>,
    verifier: &'a SignatureVerifier<C>,
    nonces: &'a NonceRegistry,
    owner: Address,
    operator: String,
    pending: VecDeque<CursorItem>,
}

impl<'a, B: BlobStore + ?Sized, C: ChainReader> LinkCursor<'a, B, C> {
    /// Observe `cancel` between chunks and between links.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.walker = self.walker.with_cancellation(cancel);
        self
    }

    /// Rewind to the head and forget nonces seen for this owner and operator.
    pub fn restart(&mut self) {
        self.nonces.clear(&self.owner, &self.operator);
        self.walker.restart();
        self.pending.clear();
    }

    pub async fn next(&mut self) -> Result<Option<CursorItem>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if self.walker.is_cancelled() {
                    self.pending.push_front(item);
                    return Err(LogError::Cancelled);
                }
                if self.accept(&item.link).await {
                    return Ok(Some(item));
                }
                continue;
            }

            let Some((address, chunk)) = self.walker.next_chunk().await? else {
                return Ok(None);
            };
            self.pending.extend(chunk.ordered_newest_first().into_iter().map(
                |(position, link)| CursorItem {
                    link: link.clone(),
                    position,
                    chunk: address,
                },
            ));
        }
    }

    /// Adapt into a `Stream`. Yields the first error, then ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<CursorItem>> + 'a
    where
        B: 'a,
        C: 'a,
    {
        stream::unfold(Some(self), |state| async move {
            let mut cursor = state?;
            match cursor.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(cursor))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    async fn accept(&self, link: &Link) -> bool {
        let scope = ReplayScope::new(self.owner, self.operator.clone(), link.signer_address);
        if !self.nonces.check_and_record(&scope, &link.nonce) {
            debug!(name = %link.name, nonce = %link.nonce, "skipping replayed nonce");
            return false;
        }
        match self.verifier.verify_link(link).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(name = %link.name, signer = %link.signer_address, "skipping invalid signature");
                false
            }
            Err(err) => {
                debug!(name = %link.name, error = %err, "skipping unverifiable link");
                false
            }
        }
    }
}
