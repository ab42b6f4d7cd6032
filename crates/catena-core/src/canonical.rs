//! Canonical JSON encoding for deterministic signing and hashing.
//!
//! The encoding rules:
//! - Object keys sorted by ordinal byte comparison
//! - Array element order preserved
//! - Numbers in the shortest form that round-trips exactly
//! - No insignificant whitespace, minimal string escaping
//! - Duplicate keys are an error
//! - In [`Mode::Signing`], every field named `signature` (any casing) is dropped
//!
//! Signer and verifier may be different implementations, so the exact bytes
//! fed into the hash must be reproducible from the field values alone.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::CoreError;

/// Field name excluded from the signing encoding.
pub const SIGNATURE_FIELD: &str = "signature";

/// Largest integer magnitude an IEEE double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Which view of a record to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Signature fields removed. Input to signature and identity hashes.
    Signing,
    /// Every field kept. Used for persisted documents (chunks, indexes, profiles).
    Storage,
}

/// A JSON tree that keeps object entries in source order, duplicates included.
///
/// `serde_json::Value` collapses duplicate keys while parsing, so raw text is
/// parsed into this tree instead to make duplicates observable.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => Node::Array(items.iter().map(Node::from).collect()),
            Value::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Node::from(v)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Number::from_f64(v)
            .map(Node::Number)
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item);
        }
        Ok(Node::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            entries.push((key, value));
        }
        Ok(Node::Object(entries))
    }
}

/// Encode any serializable record canonically.
pub fn encode<T: Serialize + ?Sized>(record: &T, mode: Mode) -> Result<Vec<u8>, CoreError> {
    let value = serde_json::to_value(record).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    encode_value(&value, mode)
}

/// Encode a `serde_json::Value` canonically.
pub fn encode_value(value: &Value, mode: Mode) -> Result<Vec<u8>, CoreError> {
    encode_node(&Node::from(value), mode)
}

/// Parse raw JSON text and encode it canonically.
///
/// This is the only entry point on which duplicate keys can be detected.
pub fn encode_str(json: &str, mode: Mode) -> Result<Vec<u8>, CoreError> {
    let node: Node =
        serde_json::from_str(json).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    encode_node(&node, mode)
}

/// Encode a parsed tree canonically.
pub fn encode_node(node: &Node, mode: Mode) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_to(&mut buf, node, mode)?;
    Ok(buf)
}

/// Canonical bytes with signature fields removed.
pub fn signing_bytes<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, CoreError> {
    encode(record, Mode::Signing)
}

/// Canonical bytes with every field kept.
pub fn storage_bytes<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, CoreError> {
    encode(record, Mode::Storage)
}

/// Recursively encode a node.
fn encode_to(buf: &mut Vec<u8>, node: &Node, mode: Mode) -> Result<(), CoreError> {
    match node {
        Node::Null => buf.extend_from_slice(b"null"),
        Node::Bool(true) => buf.extend_from_slice(b"true"),
        Node::Bool(false) => buf.extend_from_slice(b"false"),
        Node::Number(n) => encode_number(buf, n)?,
        Node::String(s) => encode_string(buf, s)?,
        Node::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode_to(buf, item, mode)?;
            }
            buf.push(b']');
        }
        Node::Object(entries) => encode_object(buf, entries, mode)?,
    }
    Ok(())
}

/// Encode an object with keys sorted by their UTF-8 bytes.
fn encode_object(buf: &mut Vec<u8>, entries: &[(String, Node)], mode: Mode) -> Result<(), CoreError> {
    let mut sorted: Vec<&(String, Node)> = entries
        .iter()
        .filter(|(key, _)| !(mode == Mode::Signing && key.eq_ignore_ascii_case(SIGNATURE_FIELD)))
        .collect();

    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    if let Some(pair) = sorted.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(CoreError::DuplicateKey(pair[0].0.clone()));
    }

    buf.push(b'{');
    for (i, (key, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        encode_string(buf, key)?;
        buf.push(b':');
        encode_to(buf, value, mode)?;
    }
    buf.push(b'}');
    Ok(())
}

/// Encode a number in its shortest round-trip form.
///
/// Integral floats inside the exact-integer range render without a fraction,
/// so `1.0` and `1` encode identically.
fn encode_number(buf: &mut Vec<u8>, n: &Number) -> Result<(), CoreError> {
    if let Some(i) = n.as_i64() {
        buf.extend_from_slice(i.to_string().as_bytes());
    } else if let Some(u) = n.as_u64() {
        buf.extend_from_slice(u.to_string().as_bytes());
    } else {
        let f = n
            .as_f64()
            .ok_or_else(|| CoreError::NonCanonicalNumber(n.to_string()))?;
        if !f.is_finite() {
            return Err(CoreError::NonCanonicalNumber(n.to_string()));
        }
        if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
            buf.extend_from_slice((f as i64).to_string().as_bytes());
        } else {
            // serde_json formats finite doubles with ryu (shortest round-trip)
            buf.extend_from_slice(n.to_string().as_bytes());
        }
    }
    Ok(())
}

/// Encode a string with minimal JSON escaping.
fn encode_string(buf: &mut Vec<u8>, s: &str) -> Result<(), CoreError> {
    serde_json::to_writer(&mut *buf, s).map_err(|e| CoreError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_keys_sorted_by_byte_order() {
        let value = json!({"b": 1, "a": 2, "B": 3, "aa": 4});
        let out = text(encode_value(&value, Mode::Storage).unwrap());
        assert_eq!(out, r#"{"B":3,"a":2,"aa":4,"b":1}"#);
    }

    #[test]
    fn test_field_order_independent() {
        let a = encode_str(r#"{"x":1,"y":{"q":true,"p":null},"z":[3,1,2]}"#, Mode::Signing).unwrap();
        let b = encode_str(r#"{"z":[3,1,2],"y":{"p":null,"q":true},"x":1}"#, Mode::Signing).unwrap();
        assert_eq!(a, b);
        assert_eq!(text(a), r#"{"x":1,"y":{"p":null,"q":true},"z":[3,1,2]}"#);
    }

    #[test]
    fn test_signature_omitted_any_casing() {
        let value = json!({
            "name": "cup",
            "signature": "0xdead",
            "nested": {"Signature": "0xbeef", "SIGNATURE": 1, "keep": 2}
        });
        let out = text(encode_value(&value, Mode::Signing).unwrap());
        assert_eq!(out, r#"{"name":"cup","nested":{"keep":2}}"#);
        assert!(!out.to_lowercase().contains("signature"));
    }

    #[test]
    fn test_storage_mode_keeps_signature() {
        let value = json!({"name": "cup", "signature": "0xdead"});
        let out = text(encode_value(&value, Mode::Storage).unwrap());
        assert_eq!(out, r#"{"name":"cup","signature":"0xdead"}"#);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = encode_str(r#"{"a":1,"b":2,"a":3}"#, Mode::Storage).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey(k) if k == "a"));
    }

    #[test]
    fn test_duplicate_signature_keys_dropped_before_check() {
        // Both copies are removed in signing mode, so nothing is duplicated
        let out = encode_str(r#"{"signature":1,"signature":2,"a":0}"#, Mode::Signing).unwrap();
        assert_eq!(text(out), r#"{"a":0}"#);
        assert!(encode_str(r#"{"signature":1,"signature":2}"#, Mode::Storage).is_err());
    }

    #[test]
    fn test_number_forms() {
        let out = text(encode_str(r#"[1.0, -0.0, 0.1, 1e2, 12345678901234567890, -7, 1.5e300]"#, Mode::Storage).unwrap());
        assert_eq!(out, "[1,0,0.1,100,12345678901234567890,-7,1.5e300]");
    }

    #[test]
    fn test_string_escaping_minimal() {
        let value = json!({"s": "a\"b\\c\nd é ☕"});
        let out = text(encode_value(&value, Mode::Storage).unwrap());
        assert_eq!(out, "{\"s\":\"a\\\"b\\\\c\\nd é ☕\"}");
    }

    #[test]
    fn test_array_order_preserved() {
        let out = text(encode_value(&json!([3, "b", "a", 1]), Mode::Storage).unwrap());
        assert_eq!(out, r#"[3,"b","a",1]"#);
    }

    #[test]
    fn test_malformed_text_is_decoding_error() {
        assert!(matches!(
            encode_str("{\"a\":", Mode::Storage),
            Err(CoreError::DecodingError(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|i| Value::Number(i.into())),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ]
    }

    fn entries() -> impl Strategy<Value = Vec<(String, Value)>> {
        prop::collection::btree_map("[a-zA-Z_]{1,8}", leaf(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn canonical_bytes_ignore_insertion_order(mut fields in entries(), seed in any::<u64>()) {
            let forward: Vec<(String, Node)> =
                fields.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect();

            // Deterministic shuffle driven by the seed
            let len = fields.len();
            if len > 1 {
                let mut s = seed;
                for i in (1..len).rev() {
                    s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    fields.swap(i, (s % (i as u64 + 1)) as usize);
                }
            }
            let shuffled: Vec<(String, Node)> =
                fields.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect();

            let a = encode_node(&Node::Object(forward), Mode::Signing).unwrap();
            let b = encode_node(&Node::Object(shuffled), Mode::Signing).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn canonical_output_reparses_to_same_value(fields in entries()) {
            let value = Value::Object(fields.into_iter().collect());
            let bytes = encode_value(&value, Mode::Storage).unwrap();
            let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(reparsed, value);
        }
    }
}
