//! The Catena facade: one handle over store, chain, registry and verifier.

use std::path::Path;
use std::sync::Arc;

use alloy_primitives::Address;
use tracing::info;

use catena_aggregate::{AggregateOutput, AggregateRequest, Aggregator, Catalog, Reducer};
use catena_core::CancellationToken;
use catena_log::{NamespaceReader, NamespaceWriter};
use catena_store::{BlobStore, ChainReader, CoalescingBlobStore, NameRegistry, SqliteBlobStore};
use catena_verify::{NonceRegistry, SignatureVerifier};

use crate::config::CatenaConfig;
use crate::error::Result;

/// Blob store as seen by every component: reads are coalesced.
pub type SharedBlobs<B> = Arc<CoalescingBlobStore<B>>;

/// Writer type handed out by [`Catena::writer`].
pub type Writer<B, R> = NamespaceWriter<SharedBlobs<B>, Arc<R>>;

/// Entry point for writing namespaces and building catalogs.
///
/// Holds shared handles only; cloning is cheap and clones share the
/// verifier's caches.
pub struct Catena<B, C, R> {
    blobs: SharedBlobs<B>,
    registry: Arc<R>,
    verifier: Arc<SignatureVerifier<Arc<C>>>,
    config: CatenaConfig,
}

impl<B, C, R> Clone for Catena<B, C, R> {
    fn clone(&self) -> Self {
        Self {
            blobs: self.blobs.clone(),
            registry: self.registry.clone(),
            verifier: self.verifier.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B, C, R> Catena<B, C, R>
where
    B: BlobStore,
    C: ChainReader,
    R: NameRegistry,
{
    pub fn new(blobs: B, chain: C, registry: R, config: CatenaConfig) -> Self {
        Self::from_parts(blobs, Arc::new(chain), Arc::new(registry), config)
    }

    /// Build around collaborators the caller also holds.
    pub fn from_parts(blobs: B, chain: Arc<C>, registry: Arc<R>, config: CatenaConfig) -> Self {
        let verifier = SignatureVerifier::with_config(chain, config.verifier.clone());
        Self {
            blobs: Arc::new(CoalescingBlobStore::new(blobs)),
            registry,
            verifier: Arc::new(verifier),
            config,
        }
    }

    pub fn config(&self) -> &CatenaConfig {
        &self.config
    }

    pub fn blobs(&self) -> &SharedBlobs<B> {
        &self.blobs
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn verifier(&self) -> &SignatureVerifier<Arc<C>> {
        &self.verifier
    }

    /// Open the single writer for `owner`'s namespace `key`.
    pub async fn writer(&self, owner: Address, key: &str) -> Result<Writer<B, R>> {
        let writer = NamespaceWriter::open(
            self.blobs.clone(),
            self.registry.clone(),
            owner,
            key,
            self.config.writer.clone(),
        )
        .await?;
        Ok(writer)
    }

    pub fn reader(&self) -> NamespaceReader<'_, CoalescingBlobStore<B>, Arc<C>> {
        NamespaceReader::new(self.blobs.as_ref(), self.verifier.as_ref())
            .with_max_chunks(self.config.aggregator.max_chunks)
    }

    /// Aggregate with a caller-owned replay registry.
    pub async fn aggregate(
        &self,
        request: &AggregateRequest,
        nonces: &NonceRegistry,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutput> {
        let output = Aggregator::new(self.blobs.as_ref(), self.registry.as_ref(), self.verifier.as_ref())
            .with_config(self.config.aggregator.clone())
            .run(request, nonces, cancel)
            .await?;
        Ok(output)
    }

    /// Aggregate with a fresh replay registry, then reduce to a catalog.
    ///
    /// The returned errors cover both passes.
    pub async fn catalog(
        &self,
        request: &AggregateRequest,
        cancel: &CancellationToken,
    ) -> Result<Catalog> {
        let nonces = NonceRegistry::new();
        let output = self.aggregate(request, &nonces, cancel).await?;

        let mut catalog = Reducer::new(self.blobs.as_ref())
            .with_concurrency(self.config.aggregator.concurrency)
            .reduce(&output.links, cancel)
            .await?;

        let mut errors = output.errors;
        errors.append(&mut catalog.errors);
        catalog.errors = errors;

        info!(
            operator = %request.operator,
            items = catalog.items.len(),
            scanned = output.scanned.len(),
            errors = catalog.errors.len(),
            "built catalog"
        );
        Ok(catalog)
    }
}

impl<C, R> Catena<SqliteBlobStore, C, R>
where
    C: ChainReader,
    R: NameRegistry,
{
    /// Open with a SQLite blob store at `path`, honouring the store config.
    pub fn open_sqlite(
        path: impl AsRef<Path>,
        chain: C,
        registry: R,
        config: CatenaConfig,
    ) -> Result<Self> {
        let blobs = SqliteBlobStore::open(path)?.with_max_blob_size(config.store.max_blob_size);
        Ok(Self::new(blobs, chain, registry, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatenaError;
    use catena_aggregate::TimeWindow;
    use catena_core::{ContentAddress, Keypair, LinkSigner};
    use catena_store::{MemoryBlobStore, MemoryChain, MemoryRegistry, StoreError};

    type MemoryCatena = Catena<MemoryBlobStore, MemoryChain, MemoryRegistry>;

    fn catena() -> MemoryCatena {
        Catena::new(
            MemoryBlobStore::new(),
            MemoryChain::new(),
            MemoryRegistry::new(),
            CatenaConfig::new(1),
        )
    }

    #[tokio::test]
    async fn test_write_then_read_through_facade() {
        let catena = catena();
        let signer = LinkSigner::plain(Keypair::from_seed(&[3; 32]).unwrap());

        let mut writer = catena.writer(signer.address(), "market").await.unwrap();
        writer
            .publish("items/cup", ContentAddress::digest(b"cup"), &signer, 10)
            .await
            .unwrap();

        let reader = catena.reader();
        let index = reader
            .open_index(catena.registry().as_ref(), &signer.address(), "market")
            .await
            .unwrap()
            .unwrap();
        let nonces = NonceRegistry::new();
        let link = reader
            .latest_by_name(signer.address(), "market", index.head, &nonces, "items/cup")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link.chain_id, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let catena = catena();
        let other = catena.clone();
        let signer = LinkSigner::plain(Keypair::from_seed(&[4; 32]).unwrap());

        catena
            .writer(signer.address(), "market")
            .await
            .unwrap()
            .publish("items/a", ContentAddress::digest(b"a"), &signer, 1)
            .await
            .unwrap();

        let request = AggregateRequest::new("market", vec![signer.address()], 1, TimeWindow::new(0, 10));
        let output = other
            .aggregate(&request, &NonceRegistry::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.links.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_surfaces() {
        let catena = catena();
        let request = AggregateRequest::new("", vec![], 1, TimeWindow::new(0, 10));
        let result = catena.catalog(&request, &CancellationToken::new()).await;
        assert!(matches!(result, Err(CatenaError::Aggregate(_))));
    }

    #[tokio::test]
    async fn test_sqlite_honours_blob_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CatenaConfig::new(1);
        config.store.max_blob_size = 16;

        let catena = Catena::open_sqlite(
            dir.path().join("blobs.db"),
            MemoryChain::new(),
            MemoryRegistry::new(),
            config,
        )
        .unwrap();
        let result = catena.blobs().put(bytes::Bytes::from(vec![0u8; 17])).await;
        assert!(matches!(result, Err(StoreError::CapacityExceeded { .. })));
    }
}
