//! Classification of catalog payloads.
//!
//! Payloads are schema.org JSON-LD documents. A `Product` publishes an item,
//! a `Tombstone` retracts one. Anything else in the schema.org vocabulary is
//! `Unknown`; anything that claims to be one of ours but is malformed is
//! `Invalid`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

const SCHEMA_ORG: &str = "https://schema.org";

fn item_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^items/([A-Za-z0-9][A-Za-z0-9._-]{0,127})$").ok())
        .as_ref()
}

fn currency_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{3}$").ok()).as_ref()
}

/// The item id in a link name of the form `items/<id>`.
pub fn item_id(name: &str) -> Option<&str> {
    item_name_pattern()?
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A priced offer attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub price: f64,
    pub price_currency: String,
    pub url: Option<Url>,
}

/// A validated schema.org `Product`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub images: Vec<Url>,
    pub offers: Vec<Offer>,
    /// The document as published.
    pub document: Value,
}

/// A validated retraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tombstone {
    pub timestamp: i64,
}

/// Outcome of classifying one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Product(Box<Product>),
    Tombstone(Tombstone),
    Unknown,
    Invalid(String),
}

/// Classify `bytes` as the payload for item `id`.
pub fn classify(bytes: &[u8], id: &str) -> Classification {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => return Classification::Invalid(format!("not JSON: {e}")),
    };
    let Value::Object(object) = value else {
        return Classification::Invalid("payload is not an object".into());
    };
    if !has_schema_context(&object) {
        return Classification::Unknown;
    }

    let result = match object.get("@type").and_then(Value::as_str) {
        Some("Product") => parse_product(&object, id).map(|p| Classification::Product(Box::new(p))),
        Some("Tombstone") => parse_tombstone(&object, id).map(Classification::Tombstone),
        _ => Ok(Classification::Unknown),
    };
    result.unwrap_or_else(Classification::Invalid)
}

fn has_schema_context(object: &Map<String, Value>) -> bool {
    let is_schema = |v: &Value| {
        v.as_str()
            .map(|s| s.trim_end_matches('/') == SCHEMA_ORG)
            .unwrap_or(false)
    };
    match object.get("@context") {
        Some(Value::Array(items)) => items.iter().any(is_schema),
        Some(other) => is_schema(other),
        None => false,
    }
}

fn parse_product(object: &Map<String, Value>, id: &str) -> Result<Product, String> {
    let product_id = require_str(object, "productID")?;
    if product_id != id {
        return Err(format!("productID {product_id:?} does not match item {id:?}"));
    }
    let name = require_str(object, "name")?;
    if name.trim().is_empty() {
        return Err("name is empty".into());
    }

    let images = match object.get("image") {
        None => Vec::new(),
        Some(image) => parse_images(image)?,
    };
    let offers = match object.get("offers") {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(parse_offer).collect::<Result<_, _>>()?,
        Some(single) => vec![parse_offer(single)?],
    };

    Ok(Product {
        product_id: product_id.to_string(),
        name: name.to_string(),
        images,
        offers,
        document: Value::Object(object.clone()),
    })
}

fn parse_tombstone(object: &Map<String, Value>, id: &str) -> Result<Tombstone, String> {
    let item_id = require_str(object, "itemId")?;
    if item_id != id {
        return Err(format!("itemId {item_id:?} does not match item {id:?}"));
    }
    let timestamp = object
        .get("timestamp")
        .and_then(Value::as_i64)
        .ok_or("timestamp must be an integer")?;
    Ok(Tombstone { timestamp })
}

fn parse_images(value: &Value) -> Result<Vec<Url>, String> {
    match value {
        Value::String(s) => Ok(vec![parse_uri(s, "image")?]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) => parse_uri(s, "image"),
                None => Err("image array must hold URI strings".into()),
            })
            .collect(),
        Value::Object(object) => {
            let uri = object
                .get("url")
                .or_else(|| object.get("contentUrl"))
                .and_then(Value::as_str)
                .ok_or("ImageObject needs url or contentUrl")?;
            Ok(vec![parse_uri(uri, "image")?])
        }
        _ => Err("image must be a URI, URI array or ImageObject".into()),
    }
}

fn parse_offer(value: &Value) -> Result<Offer, String> {
    let Value::Object(object) = value else {
        return Err("offer must be an object".into());
    };
    if object.get("@type").and_then(Value::as_str) != Some("Offer") {
        return Err("offer @type must be Offer".into());
    }

    let price = match object.get("price") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite())
    .ok_or("offer price must be numeric")?;

    let currency = require_str(object, "priceCurrency")?;
    if !currency_pattern().is_some_and(|p| p.is_match(currency)) {
        return Err(format!("bad priceCurrency {currency:?}"));
    }

    let url = match object.get("url") {
        None => None,
        Some(Value::String(s)) => Some(parse_uri(s, "offer url")?),
        Some(_) => return Err("offer url must be a string".into()),
    };

    Ok(Offer {
        price,
        price_currency: currency.to_string(),
        url,
    })
}

fn require_str<'v>(object: &'v Map<String, Value>, field: &str) -> Result<&'v str, String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{field} must be a string"))
}

fn parse_uri(s: &str, what: &str) -> Result<Url, String> {
    Url::parse(s).map_err(|e| format!("malformed {what} URI {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn cup() -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "Product",
            "productID": "cup",
            "name": "Blue cup",
            "image": { "@type": "ImageObject", "contentUrl": "https://img.example/cup.png" },
            "offers": { "@type": "Offer", "price": "10.50", "priceCurrency": "USD" }
        })
    }

    #[test]
    fn test_item_id() {
        assert_eq!(item_id("items/cup"), Some("cup"));
        assert_eq!(item_id("items/a.b_c-1"), Some("a.b_c-1"));
        assert_eq!(item_id("items/"), None);
        assert_eq!(item_id("items/-lead"), None);
        assert_eq!(item_id("items/a/b"), None);
        assert_eq!(item_id("profile"), None);
        assert_eq!(item_id(&format!("items/{}", "x".repeat(128))).map(str::len), Some(128));
        assert_eq!(item_id(&format!("items/{}", "x".repeat(129))), None);
    }

    #[test]
    fn test_product() {
        let Classification::Product(product) = classify(&bytes(cup()), "cup") else {
            panic!("expected product");
        };
        assert_eq!(product.name, "Blue cup");
        assert_eq!(product.images[0].as_str(), "https://img.example/cup.png");
        assert_eq!(product.offers[0].price, 10.5);
        assert_eq!(product.offers[0].price_currency, "USD");
    }

    #[test]
    fn test_product_variants() {
        let mut doc = cup();
        doc["@context"] = json!(["https://schema.org/", { "ex": "https://example.org" }]);
        doc["image"] = json!(["https://img.example/1.png", "https://img.example/2.png"]);
        doc["offers"] = json!([{ "@type": "Offer", "price": 3, "priceCurrency": "EUR", "url": "https://shop.example/cup" }]);

        let Classification::Product(product) = classify(&bytes(doc), "cup") else {
            panic!("expected product");
        };
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.offers[0].price, 3.0);
        assert!(product.offers[0].url.is_some());
    }

    #[test]
    fn test_tombstone() {
        let doc = json!({
            "@context": "https://schema.org",
            "@type": "Tombstone",
            "itemId": "cup",
            "timestamp": 120
        });
        assert_eq!(
            classify(&bytes(doc), "cup"),
            Classification::Tombstone(Tombstone { timestamp: 120 })
        );
    }

    #[test]
    fn test_unknown() {
        let other_type = json!({ "@context": "https://schema.org", "@type": "Event" });
        assert_eq!(classify(&bytes(other_type), "cup"), Classification::Unknown);

        let no_context = json!({ "@type": "Product", "productID": "cup", "name": "x" });
        assert_eq!(classify(&bytes(no_context), "cup"), Classification::Unknown);
    }

    #[test]
    fn test_invalid() {
        let invalid = |doc: Vec<u8>| matches!(classify(&doc, "cup"), Classification::Invalid(_));

        assert!(invalid(b"not json".to_vec()));
        assert!(invalid(bytes(json!([1, 2]))));

        // Mismatched identifier
        assert!(matches!(
            classify(&bytes(cup()), "bag"),
            Classification::Invalid(msg) if msg.contains("does not match")
        ));

        let mut doc = cup();
        doc["name"] = json!("");
        assert!(invalid(bytes(doc)));

        let mut doc = cup();
        doc["image"] = json!("not a uri");
        assert!(invalid(bytes(doc)));

        let mut doc = cup();
        doc["offers"]["priceCurrency"] = json!("usd");
        assert!(invalid(bytes(doc)));

        let mut doc = cup();
        doc["offers"]["price"] = json!("ten");
        assert!(invalid(bytes(doc)));

        let mut doc = cup();
        doc["offers"]["@type"] = json!("Demand");
        assert!(invalid(bytes(doc)));

        let tombstone = json!({
            "@context": "https://schema.org",
            "@type": "Tombstone",
            "itemId": "cup",
            "timestamp": "yesterday"
        });
        assert!(invalid(bytes(tombstone)));
    }
}
