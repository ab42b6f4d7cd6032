//! # Catena Aggregate
//!
//! Deterministic views across many avatars' namespaces.
//!
//! ## Pipeline
//!
//! ```text
//! avatars ──▶ Aggregator ──▶ AggregateOutput ──▶ Reducer ──▶ Catalog
//!             resolve          links (ordered,     classify
//!             walk             deduplicated)       first wins
//!             window           errors              tombstones
//!             replay           scanned
//!             verify
//!             authorize
//! ```
//!
//! The [`Aggregator`] scans avatars concurrently and sorts once at the end,
//! so the same inputs always give the same output. Failures for a single
//! avatar, chunk or link land in the output as [`ScanError`]s.
//!
//! The [`Reducer`] keeps one [`CatalogItem`] per (seller, item id): the
//! newest valid product, unless a newer tombstone retracted it.

pub mod aggregator;
pub mod error;
pub mod payload;
pub mod reducer;
pub mod request;

pub use aggregator::{AcceptedLink, AggregateOutput, Aggregator};
pub use error::{AggregateError, Result, ScanError, ScanStage};
pub use payload::{classify, item_id, Classification, Offer, Product, Tombstone};
pub use reducer::{Catalog, CatalogItem, Reducer};
pub use request::{
    AggregateRequest, AggregatorConfig, TimeWindow, DEFAULT_CLOCK_SKEW_MS, DEFAULT_CONCURRENCY,
};
