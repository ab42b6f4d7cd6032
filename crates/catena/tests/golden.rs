//! Golden vectors for the canonical encoding.
//!
//! Every implementation must sign the same bytes for the same link and
//! address namespace documents identically.

use catena::core::{signing_bytes, ContentAddress};
use catena_testkit::vectors::{
    all_vectors, document_vectors, expected_signing_text, generate_link_from_vector,
    verify_all_vectors,
};

#[test]
fn test_link_vectors_match() {
    for (name, matches, identity) in verify_all_vectors() {
        assert!(matches, "vector '{name}' diverged (identity {identity})");
    }
}

#[test]
fn test_signing_text_is_exact() {
    for vector in all_vectors() {
        let link = generate_link_from_vector(&vector);
        let text = String::from_utf8(signing_bytes(&link).unwrap()).unwrap();
        assert_eq!(text, expected_signing_text(&vector), "{}", vector.name);
    }
}

#[test]
fn test_document_encodings_are_exact() {
    for (name, bytes, expected) in document_vectors() {
        assert_eq!(bytes, expected.as_bytes(), "{name}");
    }
}

/// Print vectors for other implementations.
/// Run with: cargo test -p catena --test golden -- --nocapture --ignored
#[test]
#[ignore]
fn print_golden_vectors() {
    for vector in all_vectors() {
        let link = generate_link_from_vector(&vector);
        let identity = link.identity_hash().unwrap();
        println!("== {} ==", vector.name);
        println!("signing:  {}", expected_signing_text(&vector));
        println!("identity: 0x{}", hex_string(identity.as_slice()));
        println!("signature: {}", link.signature);
    }
    for (name, bytes, _) in document_vectors() {
        println!("== {name} == {}", ContentAddress::digest(&bytes));
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
