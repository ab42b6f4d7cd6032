//! Reduce an aggregated link list to one catalog entry per (seller, item).

use std::collections::HashSet;
use std::pin::pin;

use alloy_primitives::{Address, B256};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use catena_core::{CancellationToken, ContentAddress, OrderKey};
use catena_store::BlobStore;

use crate::aggregator::AcceptedLink;
use crate::error::{AggregateError, Result, ScanError, ScanStage};
use crate::payload::{classify, item_id, Classification, Product};
use crate::request::DEFAULT_CONCURRENCY;

/// The newest valid product for one seller and item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub seller: Address,
    pub item_id: String,
    pub content_address: ContentAddress,
    pub published_at: i64,
    pub identity_hash: B256,
    pub position: usize,
    pub product: Product,
}

impl CatalogItem {
    pub fn order_key(&self) -> OrderKey {
        OrderKey::new(self.published_at, self.position, self.seller, self.identity_hash)
    }
}

/// Reduced catalog plus payload-stage errors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
    pub errors: Vec<ScanError>,
}

/// Picks the winning record per (seller, item id).
///
/// Item ids compare case-insensitively, matching how names resolve in a
/// namespace. Input must already be in canonical order, newest first. The first
/// product or tombstone seen for a key decides it; a tombstone removes the
/// key from the catalog for good.
pub struct Reducer<'a, B: ?Sized> {
    blobs: &'a B,
    concurrency: usize,
}

impl<'a, B: BlobStore + ?Sized> Reducer<'a, B> {
    pub fn new(blobs: &'a B) -> Self {
        Self {
            blobs,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Number of payloads fetched ahead of classification.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub async fn reduce(&self, links: &[AcceptedLink], cancel: &CancellationToken) -> Result<Catalog> {
        let candidates = links
            .iter()
            .filter_map(|accepted| item_id(&accepted.link.name).map(|id| (accepted, id)));

        // Prefetch in order; encrypted payloads are never fetched.
        let mut fetched = pin!(stream::iter(candidates)
            .map(|(accepted, id)| async move {
                let payload = if accepted.link.encrypted {
                    None
                } else {
                    Some(self.blobs.get(&accepted.link.content_address).await)
                };
                (accepted, id, payload)
            })
            .buffered(self.concurrency.max(1)));

        let mut decided: HashSet<(Address, String)> = HashSet::new();
        let mut catalog = Catalog::default();

        while let Some((accepted, id, payload)) = fetched.next().await {
            if cancel.is_cancelled() {
                return Err(AggregateError::Cancelled);
            }
            let seller = accepted.owner;
            let key = (seller, id.to_ascii_lowercase());
            if decided.contains(&key) {
                continue;
            }

            let link = &accepted.link;
            let fail = |message: String| {
                ScanError::new(seller, ScanStage::Payload, format!("{}: {message}", link.name))
                    .at(link.content_address)
            };

            let bytes = match payload {
                None => {
                    debug!(seller = %seller, item = id, "skipping encrypted payload");
                    continue;
                }
                Some(Ok(bytes)) => bytes,
                Some(Err(err)) => {
                    record(&mut catalog.errors, fail(err.to_string()));
                    continue;
                }
            };

            match classify(&bytes, id) {
                Classification::Product(product) => {
                    decided.insert(key);
                    catalog.items.push(CatalogItem {
                        seller,
                        item_id: id.to_string(),
                        content_address: link.content_address,
                        published_at: link.signed_at,
                        identity_hash: accepted.identity,
                        position: accepted.position,
                        product: *product,
                    });
                }
                Classification::Tombstone(tombstone) => {
                    decided.insert(key);
                    debug!(seller = %seller, item = id, timestamp = tombstone.timestamp, "item retracted");
                }
                Classification::Unknown => {
                    debug!(seller = %seller, item = id, "skipping unknown payload");
                }
                Classification::Invalid(message) => record(&mut catalog.errors, fail(message)),
            }
        }

        catalog.items.sort_by_key(CatalogItem::order_key);
        info!(
            items = catalog.items.len(),
            errors = catalog.errors.len(),
            "catalog reduced"
        );
        Ok(catalog)
    }
}

fn record(errors: &mut Vec<ScanError>, error: ScanError) {
    warn!(
        scope = %error.scope,
        stage = %error.stage,
        message = %error.message,
        "payload error"
    );
    errors.push(error);
}
