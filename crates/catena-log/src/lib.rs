//! # Catena Log
//!
//! Per-owner namespaces stored as chains of content-addressed chunks.
//!
//! ## Layout
//!
//! ```text
//! registry pointer ─▶ Profile ─▶ namespaces[key] ─▶ Index
//!                                                    │ head
//!                                                    ▼
//!                                    Chunk ─prev─▶ Chunk ─prev─▶ ... ─▶ null
//! ```
//!
//! The head chunk is the only one ever rewritten. When a new name would push
//! it past capacity it is sealed and a fresh head points back to it. The
//! [`Index`](catena_core::Index) maps every name to the chunk holding its most
//! recent occurrence.
//!
//! - [`NamespaceWriter`] appends and replaces links, then flushes.
//! - [`NamespaceReader`] resolves names through the index and hands out a
//!   [`LinkCursor`] that walks newest to oldest, skipping replayed nonces and
//!   invalid signatures.
//! - [`ChunkWalker`] is the raw chain traversal both sides share with the
//!   aggregator.

pub mod docs;
pub mod error;
pub mod reader;
pub mod walk;
pub mod writer;

pub use docs::{load_chunk, load_index, load_profile, open_index, open_profile, store_doc};
pub use error::{LogError, Result};
pub use reader::{CursorItem, LinkCursor, NamespaceReader};
pub use walk::{ChunkWalker, DEFAULT_MAX_CHUNKS};
pub use writer::{FlushReceipt, NamespaceWriter, WriterConfig};
