//! Uniform get/set view over the key/value containers a budget travels in.
//!
//! The union is closed on purpose: every supported transport shape is a
//! variant, so adding a shape forces every match site to handle it at
//! compile time instead of falling through a runtime type switch.
use std::collections::HashMap;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tracing::debug;

/// Mutable view over one concrete carrier.
///
/// The carrier itself stays owned by the caller; this type only borrows it
/// for the duration of an encode/decode call.
pub enum Carrier<'a> {
    /// HTTP header map (multi-valued, case-normalizing).
    Http(&'a mut HeaderMap),
    /// gRPC request metadata (multi-valued).
    Grpc(&'a mut MetadataMap),
    /// Plain string-to-string map.
    Text(&'a mut HashMap<String, String>),
    /// String-to-JSON map; values are expected to be strings when read.
    Json(&'a mut Map<String, Value>),
}

impl Carrier<'_> {
    /// First value stored under `key`, if any.
    ///
    /// Absence is not an error. Values the shape holds but cannot present
    /// as a string (non-ASCII header bytes, a JSON number) read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Carrier::Http(headers) => headers.get(key).and_then(|v| v.to_str().ok()),
            Carrier::Grpc(metadata) => metadata.get(key).and_then(|v| v.to_str().ok()),
            Carrier::Text(map) => map.get(key).map(String::as_str),
            Carrier::Json(map) => map.get(key).and_then(Value::as_str),
        }
    }

    /// Replace every value stored under `key` with the single `value`.
    ///
    /// Keys or values a shape cannot represent are dropped with a debug
    /// note; budget fields are plain ASCII, so this only triggers on
    /// foreign input such as an exotic custom prefix.
    pub fn set(&mut self, key: &str, value: &str) {
        match self {
            Carrier::Http(headers) => {
                match (HeaderName::try_from(key), HeaderValue::from_str(value)) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => debug!(key, value, "header map cannot represent field, dropping"),
                }
            }
            Carrier::Grpc(metadata) => {
                match (
                    key.parse::<AsciiMetadataKey>(),
                    value.parse::<AsciiMetadataValue>(),
                ) {
                    (Ok(key), Ok(value)) => {
                        metadata.insert(key, value);
                    }
                    _ => debug!(key, value, "metadata map cannot represent field, dropping"),
                }
            }
            Carrier::Text(map) => {
                map.insert(key.to_string(), value.to_string());
            }
            Carrier::Json(map) => {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
}

impl<'a> From<&'a mut HeaderMap> for Carrier<'a> {
    fn from(headers: &'a mut HeaderMap) -> Self {
        Carrier::Http(headers)
    }
}

impl<'a> From<&'a mut MetadataMap> for Carrier<'a> {
    fn from(metadata: &'a mut MetadataMap) -> Self {
        Carrier::Grpc(metadata)
    }
}

impl<'a> From<&'a mut HashMap<String, String>> for Carrier<'a> {
    fn from(map: &'a mut HashMap<String, String>) -> Self {
        Carrier::Text(map)
    }
}

impl<'a> From<&'a mut Map<String, Value>> for Carrier<'a> {
    fn from(map: &'a mut Map<String, Value>) -> Self {
        Carrier::Json(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_set_and_get() {
        let mut headers = HeaderMap::new();
        let mut carrier = Carrier::Http(&mut headers);

        carrier.set("k1", "v1");
        assert_eq!(carrier.get("k1"), Some("v1"));
        assert_eq!(headers.get("k1").unwrap(), "v1");
    }

    #[test]
    fn http_get_is_case_normalized() {
        let mut headers = HeaderMap::new();
        let mut carrier = Carrier::Http(&mut headers);

        carrier.set("X-Budget", "7");
        assert_eq!(carrier.get("x-budget"), Some("7"));
    }

    #[test]
    fn http_set_replaces_all_values() {
        let mut headers = HeaderMap::new();
        headers.append("k1", HeaderValue::from_static("old-a"));
        headers.append("k1", HeaderValue::from_static("old-b"));

        let mut carrier = Carrier::Http(&mut headers);
        carrier.set("k1", "new");

        assert_eq!(headers.get_all("k1").iter().count(), 1);
        assert_eq!(headers.get("k1").unwrap(), "new");
    }

    #[test]
    fn http_unrepresentable_value_is_dropped() {
        let mut headers = HeaderMap::new();
        let mut carrier = Carrier::Http(&mut headers);

        carrier.set("k1", "line\nbreak");
        assert_eq!(carrier.get("k1"), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn grpc_set_and_get() {
        let mut metadata = MetadataMap::new();
        let mut carrier = Carrier::Grpc(&mut metadata);

        carrier.set("k1", "v1");
        assert_eq!(carrier.get("k1"), Some("v1"));
        assert_eq!(metadata.get("k1").unwrap(), "v1");
    }

    #[test]
    fn grpc_get_returns_first_value() {
        let mut metadata = MetadataMap::new();
        metadata.append("k1", "first".parse().unwrap());
        metadata.append("k1", "second".parse().unwrap());

        let carrier = Carrier::Grpc(&mut metadata);
        assert_eq!(carrier.get("k1"), Some("first"));
    }

    #[test]
    fn text_map_set_and_get() {
        let mut map = HashMap::new();
        let mut carrier = Carrier::Text(&mut map);

        carrier.set("k1", "v1");
        assert_eq!(carrier.get("k1"), Some("v1"));
        assert_eq!(map.get("k1").map(String::as_str), Some("v1"));
    }

    #[test]
    fn json_map_set_and_get() {
        let mut map = Map::new();
        let mut carrier = Carrier::Json(&mut map);

        carrier.set("k1", "v1");
        assert_eq!(carrier.get("k1"), Some("v1"));
        assert_eq!(map.get("k1"), Some(&json!("v1")));
    }

    #[test]
    fn json_non_string_value_reads_as_absent() {
        let mut map = Map::new();
        map.insert("k1".to_string(), json!(42));

        let carrier = Carrier::Json(&mut map);
        assert_eq!(carrier.get("k1"), None);
    }

    #[test]
    fn absent_key_is_none_on_every_shape() {
        let mut headers = HeaderMap::new();
        assert_eq!(Carrier::Http(&mut headers).get("missing"), None);

        let mut metadata = MetadataMap::new();
        assert_eq!(Carrier::Grpc(&mut metadata).get("missing"), None);

        let mut text = HashMap::new();
        assert_eq!(Carrier::Text(&mut text).get("missing"), None);

        let mut json = Map::new();
        assert_eq!(Carrier::Json(&mut json).get("missing"), None);
    }
}
