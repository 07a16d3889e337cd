//! # Node Payloads
//!
//! Every leaf node holds a UTF-8 JSON object.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WRITE                                 READ                             │
//! │  ─────                                 ────                             │
//! │  drop "_"-prefixed keys                absent / empty  → {}            │
//! │  children → nested JSON objects        JSON null       → {}            │
//! │  provider data never included          JSON object     → attributes    │
//! │  serde_json::to_vec                    anything else   → Malformed     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::{Map, Value};

use crate::configuration::Configuration;
use crate::error::{CoreError, CoreResult};
use crate::INTERNAL_KEY_PREFIX;

/// Builds the attribute map that is written to the store.
///
/// Children are written after attributes, so a child wins over an attribute
/// with the same key.
pub fn to_attributes(config: &Configuration) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in config.attributes() {
        if !key.starts_with(INTERNAL_KEY_PREFIX) {
            out.insert(key.clone(), value.clone());
        }
    }

    for (key, child) in config.children() {
        if !key.starts_with(INTERNAL_KEY_PREFIX) {
            out.insert(key.clone(), Value::Object(to_attributes(child)));
        }
    }

    out
}

/// Serializes a configuration into payload bytes.
pub fn encode(config: &Configuration) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(&Value::Object(to_attributes(config)))?)
}

/// Decodes payload bytes read from `path`.
///
/// `path` is only used in the error message.
pub fn decode(path: &str, bytes: Option<&[u8]>) -> CoreResult<Map<String, Value>> {
    let bytes = match bytes {
        Some(b) if !b.is_empty() => b,
        _ => return Ok(Map::new()),
    };

    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::malformed(path, format!("payload is not UTF-8: {}", e)))?;

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(CoreError::malformed(
            path,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(CoreError::malformed(path, e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_internal_keys_are_stripped() {
        let config = Configuration::with_data(
            "c",
            object(json!({"entry1": "data", "_private": "secret", "n": 1})),
        );
        let bytes = encode(&config).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"entry1":"data","n":1}"#);
    }

    #[test]
    fn test_children_encode_as_nested_objects() {
        let mut config = Configuration::new("blocks");
        config.insert_child("a", Configuration::with_data("a", object(json!({"v": 1}))));
        config.insert_child("b", Configuration::new("b"));
        assert_eq!(to_attributes(&config), object(json!({"a": {"v": 1}, "b": {}})));
    }

    #[test]
    fn test_child_overrides_attribute_with_same_key() {
        let mut config = Configuration::with_data("c", object(json!({"db": "flat", "a": 1})));
        config.insert_child("db", Configuration::with_data("db", object(json!({"host": "h"}))));

        let written = to_attributes(&config);
        assert_eq!(written.get("db"), Some(&json!({"host": "h"})));
        assert_eq!(written.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_absent_empty_and_null_decode_to_empty() {
        assert!(decode("/x", None).unwrap().is_empty());
        assert!(decode("/x", Some(b"")).unwrap().is_empty());
        assert!(decode("/x", Some(b"null")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_keeps_key_order() {
        let map = decode("/x", Some(br#"{"z": 1, "a": 2, "m": 3}"#)).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_malformed_payloads_fail() {
        assert!(matches!(
            decode("/x", Some(b"not json")),
            Err(CoreError::MalformedPayload { .. })
        ));
        assert!(matches!(
            decode("/x", Some(b"[1,2]")),
            Err(CoreError::MalformedPayload { .. })
        ));
        assert!(matches!(
            decode("/x", Some(&[0xff, 0xfe])),
            Err(CoreError::MalformedPayload { .. })
        ));
    }
}
