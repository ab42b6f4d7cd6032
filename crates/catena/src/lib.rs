//! # Catena
//!
//! Signed, content-addressed namespaces with deterministic cross-avatar
//! views.
//!
//! ## Overview
//!
//! Catena lets many independent identities ("avatars") publish signed
//! records into per-avatar, append-only logs, each anchored by one pointer in
//! an external registry. A consumer can then rebuild a verified,
//! deduplicated, time-bounded view across many such logs, such as a seller
//! catalog under one curator.
//!
//! ## Key Concepts
//!
//! - **Link**: a signed record naming a piece of content. Never mutated.
//! - **Chunk**: a content-addressed page of links, immutable once sealed.
//! - **Index**: name to chunk lookup plus the current head.
//! - **Avatar**: an identity owning a profile and namespaces. Either a plain
//!   key or a contract wallet.
//! - **Tombstone**: a catalog payload that retracts an item.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catena::{Catena, CatenaConfig};
//! use catena::aggregate::{AggregateRequest, TimeWindow};
//! use catena::core::{CancellationToken, ContentAddress, Keypair, LinkSigner};
//! use catena::store::{MemoryBlobStore, MemoryChain, MemoryRegistry};
//!
//! async fn example() -> catena::Result<()> {
//!     let config = CatenaConfig::from_env()?;
//!     let catena = Catena::new(
//!         MemoryBlobStore::new(),
//!         MemoryChain::new(),
//!         MemoryRegistry::new(),
//!         config,
//!     );
//!
//!     let signer = LinkSigner::plain(Keypair::generate());
//!     let mut writer = catena.writer(signer.address(), "market").await?;
//!     writer
//!         .publish("items/cup", ContentAddress::digest(b"{}"), &signer, 100)
//!         .await?;
//!
//!     let request = AggregateRequest::new(
//!         "market",
//!         vec![signer.address()],
//!         catena.config().chain_id(),
//!         TimeWindow::new(0, 200),
//!     );
//!     let catalog = catena.catalog(&request, &CancellationToken::new()).await?;
//!     println!("{} items", catalog.items.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `catena::core` - links, chunks, canonical encoding, signing
//! - `catena::store` - blob store, chain reader and registry traits
//! - `catena::verify` - signature verification and replay tracking
//! - `catena::log` - namespace writer and reader
//! - `catena::aggregate` - aggregation and catalog reduction

pub mod catena;
pub mod config;
pub mod error;

// Re-export component crates
pub use catena_aggregate as aggregate;
pub use catena_core as core;
pub use catena_log as log;
pub use catena_store as store;
pub use catena_verify as verify;

// Re-export main types for convenience
pub use crate::catena::{Catena, SharedBlobs, Writer};
pub use config::{CatenaConfig, ConfigError};
pub use error::{CatenaError, Result};

// Re-export commonly used types
pub use catena_aggregate::{AggregateOutput, AggregateRequest, Catalog, CatalogItem, TimeWindow};
pub use catena_core::{
    Address, CancellationToken, ContentAddress, Keypair, Link, LinkBuilder, LinkSigner,
};
pub use catena_verify::NonceRegistry;
