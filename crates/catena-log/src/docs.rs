//! Loading and storing namespace documents through a blob store.

use alloy_primitives::Address;
use bytes::Bytes;
use serde::Serialize;

use catena_core::{storage_bytes, Chunk, ContentAddress, Index, Profile};
use catena_store::{BlobStore, NameRegistry};

use crate::error::Result;

/// Persist a document in storage form and return its address.
pub async fn store_doc<B, T>(blobs: &B, doc: &T) -> Result<ContentAddress>
where
    B: BlobStore + ?Sized,
    T: Serialize + Sync,
{
    let bytes = storage_bytes(doc)?;
    Ok(blobs.put(Bytes::from(bytes)).await?)
}

pub async fn load_chunk<B: BlobStore + ?Sized>(blobs: &B, address: &ContentAddress) -> Result<Chunk> {
    let bytes = blobs.get(address).await?;
    Ok(Chunk::from_bytes(&bytes)?)
}

pub async fn load_index<B: BlobStore + ?Sized>(blobs: &B, address: &ContentAddress) -> Result<Index> {
    let bytes = blobs.get(address).await?;
    Ok(Index::from_bytes(&bytes)?)
}

pub async fn load_profile<B: BlobStore + ?Sized>(
    blobs: &B,
    address: &ContentAddress,
) -> Result<Profile> {
    let bytes = blobs.get(address).await?;
    Ok(Profile::from_bytes(&bytes)?)
}

/// Resolve registry pointer to profile. `None` if the avatar never published.
pub async fn open_profile<B, R>(blobs: &B, registry: &R, owner: &Address) -> Result<Option<Profile>>
where
    B: BlobStore + ?Sized,
    R: NameRegistry + ?Sized,
{
    match registry.get_pointer(owner).await? {
        Some(pointer) => Ok(Some(load_profile(blobs, &pointer).await?)),
        None => Ok(None),
    }
}

/// Resolve registry pointer to profile to the index for `key`.
pub async fn open_index<B, R>(
    blobs: &B,
    registry: &R,
    owner: &Address,
    key: &str,
) -> Result<Option<Index>>
where
    B: BlobStore + ?Sized,
    R: NameRegistry + ?Sized,
{
    let Some(profile) = open_profile(blobs, registry, owner).await? else {
        return Ok(None);
    };
    match profile.namespace(key) {
        Some(address) => Ok(Some(load_index(blobs, &address).await?)),
        None => Ok(None),
    }
}
