//! Persisted documents of a namespace: chunks, indexes and profiles.
//!
//! All three are stored as canonical JSON in [`Mode::Storage`](crate::canonical::Mode)
//! and addressed by the Blake3 digest of those bytes.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::canonical::storage_bytes;
use crate::error::CoreError;
use crate::link::Link;
use crate::types::ContentAddress;

/// Default number of links per chunk before rotation.
pub const DEFAULT_CHUNK_CAPACITY: usize = 64;

/// Encode a document and compute its content address.
pub fn seal<T: Serialize>(doc: &T) -> Result<(ContentAddress, Vec<u8>), CoreError> {
    let bytes = storage_bytes(doc)?;
    Ok((ContentAddress::digest(&bytes), bytes))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::MalformedDocument(format!("{what}: {e}")))
}

/// Outcome of inserting a link into a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An entry with the same name was overwritten at this position.
    Replaced(usize),
    /// The link was appended at this position.
    Appended(usize),
}

impl Upsert {
    pub fn position(self) -> usize {
        match self {
            Self::Replaced(p) | Self::Appended(p) => p,
        }
    }
}

/// One page of link history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Address of the next older chunk.
    pub prev: Option<ContentAddress>,
    pub links: Vec<Link>,
}

impl Chunk {
    /// An empty head chunk following `prev`.
    pub fn new(prev: Option<ContentAddress>) -> Self {
        Self {
            prev,
            links: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Position of the entry with exactly this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|l| l.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace the entry with the same name in place, or append.
    pub fn upsert(&mut self, link: Link) -> Upsert {
        match self.position(&link.name) {
            Some(pos) => {
                self.links[pos] = link;
                Upsert::Replaced(pos)
            }
            None => {
                self.links.push(link);
                Upsert::Appended(self.links.len() - 1)
            }
        }
    }

    /// Links paired with their position, newest first.
    ///
    /// Ordered by `signed_at` descending, then position descending.
    pub fn ordered_newest_first(&self) -> Vec<(usize, &Link)> {
        let mut entries: Vec<(usize, &Link)> = self.links.iter().enumerate().collect();
        entries.sort_by(|a, b| {
            b.1.signed_at
                .cmp(&a.1.signed_at)
                .then_with(|| b.0.cmp(&a.0))
        });
        entries
    }

    /// Canonical storage bytes and the resulting address.
    pub fn seal(&self) -> Result<(ContentAddress, Vec<u8>), CoreError> {
        seal(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode(bytes, "chunk")
    }
}

/// Random-access view of a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Address of the current head chunk.
    pub head: Option<ContentAddress>,
    /// Name to the chunk holding its most recent occurrence.
    #[serde(default)]
    pub entries: BTreeMap<String, ContentAddress>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, chunk: ContentAddress) {
        self.entries.insert(name.into(), chunk);
    }

    /// Record every name of `chunk` as living at `address`.
    pub fn record_chunk(&mut self, chunk: &Chunk, address: ContentAddress) {
        for link in &chunk.links {
            self.record(link.name.clone(), address);
        }
    }

    /// Chunk address for a name: exact match first, then case-insensitive.
    pub fn resolve(&self, name: &str) -> Option<ContentAddress> {
        if let Some(addr) = self.entries.get(name) {
            return Some(*addr);
        }
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, addr)| *addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn seal(&self) -> Result<(ContentAddress, Vec<u8>), CoreError> {
        seal(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode(bytes, "index")
    }
}

/// A delegated signing key with a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningKeyWindow {
    pub address: Address,
    /// Inclusive lower bound (Unix milliseconds).
    pub valid_from: i64,
    /// Exclusive upper bound; open-ended when absent.
    #[serde(default)]
    pub valid_until: Option<i64>,
}

impl SigningKeyWindow {
    pub fn covers(&self, signer: &Address, signed_at: i64) -> bool {
        self.address == *signer
            && self.valid_from <= signed_at
            && self.valid_until.map_or(true, |until| signed_at < until)
    }
}

/// An avatar's published root document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Namespace key to index address.
    #[serde(default)]
    pub namespaces: BTreeMap<String, ContentAddress>,
    #[serde(default)]
    pub signing_keys: Vec<SigningKeyWindow>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self, key: &str) -> Option<ContentAddress> {
        self.namespaces.get(key).copied()
    }

    pub fn set_namespace(&mut self, key: impl Into<String>, index: ContentAddress) {
        self.namespaces.insert(key.into(), index);
    }

    pub fn add_signing_key(&mut self, window: SigningKeyWindow) {
        if !self.signing_keys.contains(&window) {
            self.signing_keys.push(window);
        }
    }

    /// Whether `signer` may sign for `avatar` at `signed_at`.
    pub fn is_authorized(&self, avatar: &Address, signer: &Address, signed_at: i64) -> bool {
        signer == avatar || self.signing_keys.iter().any(|w| w.covers(signer, signed_at))
    }

    pub fn seal(&self) -> Result<(ContentAddress, Vec<u8>), CoreError> {
        seal(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode(bytes, "profile")
    }
}
