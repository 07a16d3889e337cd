//! # Shard Mappings
//!
//! Maps a top-level configuration name to the shard token inserted right
//! under the root path.
//!
//! ## Why Shards?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                Sharing configuration across instances                   │
//! │                                                                         │
//! │  instance1  {"modules": 2, "blocks": 3, "services": 4, "default": 1}   │
//! │  instance2  {"modules": 2, "blocks": 5, "services": 6, "default": 1}   │
//! │  instance3  {"modules": 2, "blocks": 3, "services": 4, "default": 1}   │
//! │                                                                         │
//! │  /root/2/modules    ← shared by all three                              │
//! │  /root/3/blocks     ← instance1 + instance3                            │
//! │  /root/5/blocks     ← instance2 only                                   │
//! │  /root/1/<other>    ← everything unmapped, shared by all               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tokens are opaque: they are never interpreted, only rendered into paths.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_MAPPING_KEY, FALLBACK_SHARD};

// =============================================================================
// Shard Token
// =============================================================================

/// A path segment identifying a shard.
///
/// Built from a JSON string or integer; `"A"` renders as `A`, `3` as `3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardToken(String);

impl ShardToken {
    /// Converts a mapping value into a token.
    ///
    /// Strings and integers are accepted. Anything else (null, bool, float,
    /// array, object) is rejected so the table fails at parse time instead of
    /// producing a surprising path later.
    pub fn from_value(name: &str, value: &Value) -> CoreResult<Self> {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            other => {
                return Err(CoreError::InvalidShardToken {
                    name: name.to_string(),
                    reason: format!("expected a string or integer, got {}", other),
                })
            }
        };

        if rendered.is_empty() || rendered.contains('/') {
            return Err(CoreError::InvalidShardToken {
                name: name.to_string(),
                reason: format!("'{}' is not a single path segment", rendered),
            });
        }

        Ok(ShardToken(rendered))
    }

    /// Returns the token as it appears in a path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Shard Mappings
// =============================================================================

/// Parsed `name → shard token` table.
///
/// ## Usage
/// ```rust
/// use zkconf_core::ShardMappings;
///
/// let mappings = ShardMappings::from_json(r#"{"modules": "A", "default": "B"}"#).unwrap();
/// assert_eq!(mappings.resolve("modules").as_str(), "A");
/// assert_eq!(mappings.resolve("blocks").as_str(), "B");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardMappings {
    entries: HashMap<String, ShardToken>,
    default: ShardToken,
}

impl ShardMappings {
    /// Parses a raw JSON mapping string.
    ///
    /// Fails fast if the string is not a JSON object.
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidMappings(e.to_string()))?;

        match value {
            Value::Object(map) => Self::from_map(&map),
            other => Err(CoreError::InvalidMappings(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Builds the table from an already-parsed object.
    pub fn from_map(map: &Map<String, Value>) -> CoreResult<Self> {
        let mut entries = HashMap::with_capacity(map.len());
        let mut default = ShardToken(FALLBACK_SHARD.to_string());

        for (name, value) in map {
            let token = ShardToken::from_value(name, value)?;
            if name == DEFAULT_MAPPING_KEY {
                default = token.clone();
            }
            entries.insert(name.clone(), token);
        }

        Ok(ShardMappings { entries, default })
    }

    /// Returns the shard for `name`, falling back to the default shard.
    ///
    /// Total: an unmapped name never fails, it just lands on the default.
    pub fn resolve(&self, name: &str) -> &ShardToken {
        self.entries.get(name).unwrap_or(&self.default)
    }

    /// Returns the shard used for unmapped names.
    pub fn default_shard(&self) -> &ShardToken {
        &self.default
    }

    /// Number of explicit entries (including `"default"` if present).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ShardMappings {
    /// The zero-configuration table: `{"default": 1}`.
    fn default() -> Self {
        ShardMappings {
            entries: HashMap::new(),
            default: ShardToken(FALLBACK_SHARD.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_and_default_resolution() {
        let mappings = ShardMappings::from_json(r#"{"modules": "A", "default": "B"}"#).unwrap();
        assert_eq!(mappings.resolve("modules").as_str(), "A");
        assert_eq!(mappings.resolve("blocks").as_str(), "B");
        assert_eq!(mappings.resolve("services"), mappings.resolve("default"));
    }

    #[test]
    fn test_missing_default_falls_back_to_one() {
        let mappings = ShardMappings::from_json(r#"{"modules": 2}"#).unwrap();
        assert_eq!(mappings.resolve("modules").as_str(), "2");
        assert_eq!(mappings.resolve("anything").as_str(), "1");
        assert_eq!(mappings.default_shard().as_str(), "1");
        assert_eq!(ShardMappings::default().resolve("blocks").as_str(), "1");
    }

    #[test]
    fn test_integer_tokens_render_verbatim() {
        let map = json!({"blocks": 3, "default": 1});
        let mappings = ShardMappings::from_map(map.as_object().unwrap()).unwrap();
        assert_eq!(mappings.resolve("blocks").to_string(), "3");
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert!(matches!(
            ShardMappings::from_json("not json"),
            Err(CoreError::InvalidMappings(_))
        ));
        assert!(matches!(
            ShardMappings::from_json("[1, 2]"),
            Err(CoreError::InvalidMappings(_))
        ));
    }

    #[test]
    fn test_rejects_unusable_tokens() {
        for raw in [
            r#"{"blocks": null}"#,
            r#"{"blocks": true}"#,
            r#"{"blocks": 1.5}"#,
            r#"{"blocks": {"a": 1}}"#,
            r#"{"blocks": ""}"#,
            r#"{"blocks": "a/b"}"#,
        ] {
            let err = ShardMappings::from_json(raw).unwrap_err();
            assert!(err.is_mapping_error(), "{} should be rejected", raw);
        }
    }
}
