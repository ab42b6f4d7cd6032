//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: sellers with deterministic keys
//! and an in-memory marketplace wired through the [`Catena`] facade.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use serde_json::{json, Value};

use catena::{Catena, CatenaConfig};
use catena_aggregate::{AggregateRequest, Catalog, TimeWindow};
use catena_core::{Address, CancellationToken, ContentAddress, Keypair, Link, LinkSigner};
use catena_store::{BlobStore, MemoryBlobStore, MemoryChain, MemoryRegistry, WalletContract};

/// Operator scope used by [`Marketplace::new`].
pub const DEFAULT_OPERATOR: &str = "market";

/// A seller with a deterministic key.
pub struct SellerFixture {
    pub signer: LinkSigner,
    /// Key that actually signs; differs from the address for wallets.
    pub owner: Address,
}

impl SellerFixture {
    /// Plain-key seller from a one-byte seed.
    pub fn new(seed: u8) -> Self {
        Self::with_seed([seed; 32])
    }

    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = key(seed);
        let owner = keypair.address();
        Self {
            signer: LinkSigner::plain(keypair),
            owner,
        }
    }

    /// Seller whose identity is a contract wallet at `wallet`.
    ///
    /// The wallet must be deployed with [`Marketplace::deploy_wallet`].
    pub fn contract_wallet(seed: u8, wallet: Address, chain_id: u64) -> Self {
        let keypair = key([seed; 32]);
        let owner = keypair.address();
        Self {
            signer: LinkSigner::contract_wallet(keypair, wallet, chain_id),
            owner,
        }
    }

    /// The identity links are published under.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

fn key(seed: [u8; 32]) -> Keypair {
    match Keypair::from_seed(&seed) {
        Ok(keypair) => keypair,
        Err(e) => panic!("fixture seed is not a valid key: {e}"),
    }
}

/// schema.org Product payload with one USD offer.
pub fn product_doc(id: &str, name: &str, price: f64) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "productID": id,
        "name": name,
        "image": format!("https://img.example/{id}.png"),
        "offers": { "@type": "Offer", "price": price, "priceCurrency": "USD" }
    })
}

/// Retraction payload for `id`.
pub fn tombstone_doc(id: &str, timestamp: i64) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Tombstone",
        "itemId": id,
        "timestamp": timestamp
    })
}

pub type MemoryCatena = Catena<MemoryBlobStore, MemoryChain, MemoryRegistry>;

/// In-memory marketplace: blob store, chain, registry and one operator scope.
pub struct Marketplace {
    pub catena: MemoryCatena,
    pub chain: Arc<MemoryChain>,
    pub operator: String,
}

impl Marketplace {
    pub fn new(chain_id: u64) -> Self {
        Self::with_config(DEFAULT_OPERATOR, CatenaConfig::new(chain_id))
    }

    pub fn with_config(operator: &str, config: CatenaConfig) -> Self {
        let chain = Arc::new(MemoryChain::new());
        let catena = Catena::from_parts(
            MemoryBlobStore::new(),
            chain.clone(),
            Arc::new(MemoryRegistry::new()),
            config,
        );
        Self {
            catena,
            chain,
            operator: operator.to_string(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.catena.config().chain_id()
    }

    /// Put a wallet contract at the seller's address, owned by its key.
    pub fn deploy_wallet(&self, seller: &SellerFixture) -> anyhow::Result<()> {
        let wallet = WalletContract::new(seller.owner, self.chain_id());
        self.chain
            .deploy_wallet(seller.address(), wallet)
            .context("deploying wallet")
    }

    /// Store a JSON payload and return its address.
    pub async fn put_doc(&self, doc: &Value) -> anyhow::Result<ContentAddress> {
        let bytes = serde_json::to_vec(doc)?;
        Ok(self.catena.blobs().put(Bytes::from(bytes)).await?)
    }

    /// Publish `doc` under `name` in the seller's namespace.
    pub async fn publish(
        &self,
        seller: &SellerFixture,
        name: &str,
        doc: &Value,
        signed_at: i64,
    ) -> anyhow::Result<Link> {
        let address = self.put_doc(doc).await?;
        let mut writer = self
            .catena
            .writer(seller.address(), &self.operator)
            .await
            .context("opening writer")?;
        let link = writer
            .publish(name, address, &seller.signer, signed_at)
            .await
            .with_context(|| format!("publishing {name}"))?;
        Ok(link)
    }

    pub async fn list_product(
        &self,
        seller: &SellerFixture,
        id: &str,
        price: f64,
        signed_at: i64,
    ) -> anyhow::Result<Link> {
        let doc = product_doc(id, id, price);
        self.publish(seller, &format!("items/{id}"), &doc, signed_at).await
    }

    pub async fn retract(
        &self,
        seller: &SellerFixture,
        id: &str,
        signed_at: i64,
    ) -> anyhow::Result<Link> {
        let doc = tombstone_doc(id, signed_at);
        self.publish(seller, &format!("items/{id}"), &doc, signed_at).await
    }

    pub fn request(&self, sellers: &[&SellerFixture], window: TimeWindow) -> AggregateRequest {
        AggregateRequest::new(
            self.operator.clone(),
            sellers.iter().map(|s| s.address()).collect(),
            self.chain_id(),
            window,
        )
    }

    /// Aggregate and reduce over `sellers`.
    pub async fn catalog(
        &self,
        sellers: &[&SellerFixture],
        window: TimeWindow,
    ) -> anyhow::Result<Catalog> {
        let request = self.request(sellers, window);
        Ok(self
            .catena
            .catalog(&request, &CancellationToken::new())
            .await?)
    }
}

/// `n` plain-key sellers with seeds `1..=n`.
pub fn sellers(n: u8) -> Vec<SellerFixture> {
    (1..=n).map(SellerFixture::new).collect()
}

/// Item id and first offer price for each catalog entry, in order.
pub fn catalog_summary(catalog: &Catalog) -> Vec<(String, f64)> {
    catalog
        .items
        .iter()
        .map(|item| {
            let price = item.product.offers.first().map(|o| o.price).unwrap_or(f64::NAN);
            (item.item_id.clone(), price)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_addresses_differ() {
        let all = sellers(3);
        assert_ne!(all[0].address(), all[1].address());
        assert_eq!(all[0].address(), all[0].owner);
    }

    #[test]
    fn test_wallet_seller_uses_wallet_address() {
        let wallet = Address::repeat_byte(0xab);
        let seller = SellerFixture::contract_wallet(5, wallet, 1);
        assert_eq!(seller.address(), wallet);
        assert_ne!(seller.owner, wallet);
    }

    #[tokio::test]
    async fn test_marketplace_lists_and_retracts() {
        let market = Marketplace::new(1);
        let seller = SellerFixture::new(1);

        market.list_product(&seller, "cup", 10.0, 100).await.unwrap();
        let catalog = market.catalog(&[&seller], TimeWindow::new(0, 200)).await.unwrap();
        assert_eq!(catalog_summary(&catalog), vec![("cup".to_string(), 10.0)]);

        market.retract(&seller, "cup", 150).await.unwrap();
        let catalog = market.catalog(&[&seller], TimeWindow::new(0, 200)).await.unwrap();
        assert!(catalog.items.is_empty());
    }
}
