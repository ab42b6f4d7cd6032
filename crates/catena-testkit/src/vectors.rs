//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding of links and namespace
//! documents so that every implementation signs and addresses the same
//! bytes.
//!
//! Link vectors use the private keys `1` and `2`, whose addresses are well
//! known. The expected signing text carries a `{signer}` placeholder for the
//! address string so the vectors do not depend on address casing.

use alloy_primitives::address;

use catena_core::{
    signing_bytes, storage_bytes, Address, Chunk, ContentAddress, Index, Keypair, Link,
    LinkBuilder, LinkSigner, Profile,
};

/// A golden link vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Private key scalar, big-endian.
    pub seed: [u8; 32],
    /// Address derived from `seed`.
    pub signer: Address,
    pub link_name: &'static str,
    /// Content address, hex.
    pub content_address: &'static str,
    pub chain_id: u64,
    pub signed_at: i64,
    pub nonce: &'static str,
    pub encrypted: bool,
    /// Expected signing text with `{signer}` standing for the address.
    pub expected_signing: &'static str,
    /// Expected identity hash (hex). Empty means report only.
    pub expected_identity: &'static str,
}

const fn scalar(last: u8) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[31] = last;
    seed
}

/// Get all golden link vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "plain cup",
            seed: scalar(1),
            signer: address!("7E5F4552091A69125d5DfCb7b8C2659029395Bdf"),
            link_name: "items/cup",
            content_address: "1111111111111111111111111111111111111111111111111111111111111111",
            chain_id: 1,
            signed_at: 100,
            nonce: "00ff",
            encrypted: false,
            expected_signing: concat!(
                r#"{"chainId":1,"#,
                r#""contentAddress":"1111111111111111111111111111111111111111111111111111111111111111","#,
                r#""encrypted":false,"name":"items/cup","nonce":"00ff","signedAt":100,"#,
                r#""signerAddress":{signer}}"#
            ),
            expected_identity: "",
        },
        GoldenVector {
            name: "encrypted with escapes",
            seed: scalar(2),
            signer: address!("2B5AD5c4795c026514f8317c7a215E218DcCD6cF"),
            link_name: "notes/\"quoted\" é",
            content_address: "abababababababababababababababababababababababababababababababab",
            chain_id: 8453,
            signed_at: 1_736_870_400_000,
            nonce: "0123456789abcdef0123456789abcdef",
            encrypted: true,
            expected_signing: concat!(
                r#"{"chainId":8453,"#,
                r#""contentAddress":"abababababababababababababababababababababababababababababababab","#,
                r#""encrypted":true,"name":"notes/\"quoted\" é","#,
                r#""nonce":"0123456789abcdef0123456789abcdef","signedAt":1736870400000,"#,
                r#""signerAddress":{signer}}"#
            ),
            expected_identity: "",
        },
    ]
}

/// Build and sign the link described by a vector.
pub fn generate_link_from_vector(vector: &GoldenVector) -> Link {
    let keypair = match Keypair::from_seed(&vector.seed) {
        Ok(keypair) => keypair,
        Err(e) => panic!("vector '{}' has an invalid seed: {e}", vector.name),
    };
    let content_address = match ContentAddress::from_hex(vector.content_address) {
        Ok(address) => address,
        Err(e) => panic!("vector '{}' has a bad content address: {e}", vector.name),
    };
    let result = LinkBuilder::new(vector.link_name, content_address, vector.chain_id)
        .signed_at(vector.signed_at)
        .nonce(vector.nonce)
        .encrypted(vector.encrypted)
        .sign(&LinkSigner::plain(keypair));
    match result {
        Ok(link) => link,
        Err(e) => panic!("vector '{}' failed to sign: {e}", vector.name),
    }
}

/// The vector's expected signing text with the signer filled in.
pub fn expected_signing_text(vector: &GoldenVector) -> String {
    let signer = match serde_json::to_string(&vector.signer) {
        Ok(s) => s,
        Err(e) => panic!("address does not serialize: {e}"),
    };
    vector.expected_signing.replace("{signer}", &signer)
}

/// Check every vector; returns (name, matches, identity hex).
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let link = generate_link_from_vector(v);
            let text = link
                .signing_bytes()
                .ok()
                .and_then(|b| String::from_utf8(b).ok())
                .unwrap_or_default();
            let identity = link
                .identity_hash()
                .map(|h| hex::encode(h.as_slice()))
                .unwrap_or_default();

            let matches = link.signer_address == v.signer
                && text == expected_signing_text(v)
                && (v.expected_identity.is_empty() || identity == v.expected_identity);

            (v.name.to_string(), matches, identity)
        })
        .collect()
}

/// Storage encodings of empty namespace documents.
pub fn document_vectors() -> Vec<(&'static str, Vec<u8>, &'static str)> {
    let encode = |r: Result<Vec<u8>, catena_core::CoreError>| r.unwrap_or_default();
    vec![
        (
            "empty chunk",
            encode(storage_bytes(&Chunk::new(None))),
            r#"{"links":[],"prev":null}"#,
        ),
        (
            "empty index",
            encode(storage_bytes(&Index::new())),
            r#"{"entries":{},"head":null}"#,
        ),
        (
            "empty profile",
            encode(storage_bytes(&Profile::new())),
            r#"{"namespaces":{},"signingKeys":[]}"#,
        ),
    ]
}
