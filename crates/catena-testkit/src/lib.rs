//! # Catena Testkit
//!
//! Testing utilities for Catena.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed links and documents with their exact canonical bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: sellers with deterministic keys and an in-memory marketplace
//!
//! ## Golden Vectors
//!
//! ```rust
//! use catena_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, identity) in verify_all_vectors() {
//!     println!("{name}: {matches} {identity}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use catena_testkit::generators::{link_from_params, LinkParams};
//!
//! proptest! {
//!     #[test]
//!     fn identity_is_deterministic(params: LinkParams) {
//!         let l1 = link_from_params(&params);
//!         let l2 = link_from_params(&params);
//!         prop_assert_eq!(l1.identity_hash().unwrap(), l2.identity_hash().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use catena::TimeWindow;
//! use catena_testkit::fixtures::{Marketplace, SellerFixture};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let market = Marketplace::new(1);
//!     let seller = SellerFixture::new(1);
//!     market.list_product(&seller, "cup", 10.0, 100).await?;
//!     let catalog = market.catalog(&[&seller], TimeWindow::new(0, 200)).await?;
//!     assert_eq!(catalog.items.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    catalog_summary, product_doc, sellers, tombstone_doc, Marketplace, SellerFixture,
};
pub use generators::{link_from_params, LinkParams};
pub use vectors::{all_vectors, generate_link_from_vector, verify_all_vectors, GoldenVector};
