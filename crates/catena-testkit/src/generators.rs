//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use catena_core::{Address, ContentAddress, Keypair, Link, LinkBuilder, LinkSigner};

/// Generate a random keypair.
///
/// Seeds outside the curve order are rejected and redrawn.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("seed is not a valid scalar", |seed| {
        Keypair::from_seed(&seed).ok()
    })
}

/// Generate a random non-zero address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>()
        .prop_filter("zero address", |bytes| bytes.iter().any(|b| *b != 0))
        .prop_map(Address::from)
}

/// Generate a random ContentAddress.
pub fn content_address() -> impl Strategy<Value = ContentAddress> {
    any::<[u8; 32]>().prop_map(ContentAddress::from_bytes)
}

/// Generate an item link name.
pub fn item_name() -> impl Strategy<Value = String> {
    "items/[A-Za-z0-9][A-Za-z0-9._-]{0,31}".prop_map(String::from)
}

/// Generate a hex nonce.
pub fn nonce() -> impl Strategy<Value = String> {
    "[0-9a-f]{2,64}".prop_map(String::from)
}

/// Generate a reasonable signing time in milliseconds.
pub fn signed_at() -> impl Strategy<Value = i64> {
    0i64..=1_900_000_000_000i64
}

/// Generate an arbitrary JSON value of bounded depth.
///
/// Floats are left out; canonical numbers are covered by unit tests.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        "[ -~]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z@_]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// Parameters for generating a link.
#[derive(Debug, Clone)]
pub struct LinkParams {
    pub seed: [u8; 32],
    pub name: String,
    pub content_address: ContentAddress,
    pub chain_id: u64,
    pub signed_at: i64,
    pub nonce: String,
    pub encrypted: bool,
}

impl Arbitrary for LinkParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>().prop_filter("invalid scalar", |s| Keypair::from_seed(s).is_ok()),
            item_name(),
            content_address(),
            1u64..=100_000u64,
            signed_at(),
            nonce(),
            any::<bool>(),
        )
            .prop_map(
                |(seed, name, content_address, chain_id, signed_at, nonce, encrypted)| LinkParams {
                    seed,
                    name,
                    content_address,
                    chain_id,
                    signed_at,
                    nonce,
                    encrypted,
                },
            )
            .boxed()
    }
}

impl LinkParams {
    pub fn signer(&self) -> LinkSigner {
        match Keypair::from_seed(&self.seed) {
            Ok(keypair) => LinkSigner::plain(keypair),
            Err(e) => panic!("generated seed rejected: {e}"),
        }
    }
}

/// Build and sign a link from parameters.
pub fn link_from_params(params: &LinkParams) -> Link {
    let result = LinkBuilder::new(params.name.clone(), params.content_address, params.chain_id)
        .signed_at(params.signed_at)
        .nonce(params.nonce.clone())
        .encrypted(params.encrypted)
        .sign(&params.signer());
    match result {
        Ok(link) => link,
        Err(e) => panic!("signing generated link failed: {e}"),
    }
}
