//! Newest-to-oldest traversal of a chunk chain.

use std::collections::HashSet;

use catena_core::{CancellationToken, Chunk, ContentAddress};
use catena_store::BlobStore;
use tracing::debug;

use crate::docs::load_chunk;
use crate::error::{LogError, Result};

/// Default maximum number of chunks visited in one walk.
pub const DEFAULT_MAX_CHUNKS: usize = 4096;

/// Follows `prev` links from a head chunk.
///
/// Stops at a null `prev`, on the first error, on a repeated address, or
/// when the chunk budget is spent. Cancellation is observed before each
/// fetch; callers working through a chunk can poll
/// [`is_cancelled`](Self::is_cancelled) between links.
pub struct ChunkWalker<'a, B: ?Sized> {
    blobs: &'a B,
    head: Option<ContentAddress>,
    next: Option<ContentAddress>,
    current: Option<ContentAddress>,
    seen: HashSet<ContentAddress>,
    max_chunks: usize,
    cancel: CancellationToken,
}

impl<'a, B: BlobStore + ?Sized> ChunkWalker<'a, B> {
    pub fn new(blobs: &'a B, head: Option<ContentAddress>) -> Self {
        Self {
            blobs,
            head,
            next: head,
            current: None,
            seen: HashSet::new(),
            max_chunks: DEFAULT_MAX_CHUNKS,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Number of chunks visited so far.
    pub fn visited(&self) -> usize {
        self.seen.len()
    }

    /// The chunk most recently attempted, including a failed attempt.
    pub fn current(&self) -> Option<ContentAddress> {
        self.current
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Start again from the head.
    pub fn restart(&mut self) {
        self.next = self.head;
        self.current = None;
        self.seen.clear();
    }

    /// Fetch the next older chunk.
    pub async fn next_chunk(&mut self) -> Result<Option<(ContentAddress, Chunk)>> {
        let Some(address) = self.next.take() else {
            return Ok(None);
        };
        self.current = Some(address);
        if self.cancel.is_cancelled() {
            return Err(LogError::Cancelled);
        }
        if self.seen.len() >= self.max_chunks {
            return Err(LogError::MaxDepth(self.max_chunks));
        }
        if !self.seen.insert(address) {
            return Err(LogError::CycleDetected(address));
        }

        let chunk = load_chunk(self.blobs, &address).await?;
        debug!(chunk = %address, links = chunk.len(), "loaded chunk");
        self.next = chunk.prev;
        Ok(Some((address, chunk)))
    }
}
