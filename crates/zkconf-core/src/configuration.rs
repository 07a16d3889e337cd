//! # Configuration Tree
//!
//! The two-level configuration model mirrored onto the store.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration "blocks"          provider data: /root/B/blocks, cont.  │
//! │  ├── attributes  {}                                                    │
//! │  └── children                                                          │
//! │      ├── "a" → Configuration     provider data: /root/B/blocks/a       │
//! │      │         attributes {"v": 1}                                     │
//! │      └── "b" → Configuration     provider data: /root/B/blocks/b       │
//! │                attributes {}                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Provider data lives in its own field, so it is never part of the
//! attribute map and never reaches a payload.
//!
//! ## Variable Substitution
//! String attributes may reference environment variables as `[[NAME]]`.
//! When a configuration is built with `substitute = true`,
//! [`Configuration::resolve`] expands them. The stored attributes are never
//! rewritten, so saving a fetched configuration writes back the raw values.

use serde_json::{Map, Value};

use crate::path::NodePath;

// =============================================================================
// Provider Data
// =============================================================================

/// Store metadata attached to every configuration the provider touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderData {
    /// Fully resolved store path of this node.
    pub path: NodePath,

    /// True if the node was fetched as a parent with children.
    pub is_container: bool,
}

impl ProviderData {
    /// Metadata for a leaf record.
    pub fn leaf(path: NodePath) -> Self {
        ProviderData {
            path,
            is_container: false,
        }
    }

    /// Metadata for a container record.
    pub fn container(path: NodePath) -> Self {
        ProviderData {
            path,
            is_container: true,
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// A named configuration: ordered attributes plus ordered sub-configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    name: String,
    attributes: Map<String, Value>,
    children: Vec<(String, Configuration)>,
    substitute: bool,
    provider_data: Option<ProviderData>,
}

impl Configuration {
    /// Creates an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Configuration {
            name: name.into(),
            attributes: Map::new(),
            children: Vec::new(),
            substitute: true,
            provider_data: None,
        }
    }

    /// Creates a configuration holding `attributes`.
    pub fn with_data(name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Configuration {
            attributes,
            ..Self::new(name)
        }
    }

    /// Builds a configuration from a decoded record.
    ///
    /// `substitute` controls whether [`resolve`](Self::resolve) expands
    /// `[[VAR]]` references.
    pub fn from_record(
        name: impl Into<String>,
        attributes: Map<String, Value>,
        substitute: bool,
    ) -> Self {
        Configuration {
            name: name.into(),
            attributes,
            children: Vec::new(),
            substitute,
            provider_data: None,
        }
    }

    /// Returns the configuration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw attribute map.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns the value of `key` with `[[VAR]]` references expanded when
    /// substitution is enabled.
    pub fn resolve(&self, key: &str) -> Option<Value> {
        let value = self.attributes.get(key)?;
        if self.substitute {
            Some(substitute_value(value, &|name| std::env::var(name).ok()))
        } else {
            Some(value.clone())
        }
    }

    /// Sets an attribute, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(key.into(), value)
    }

    /// Removes an attribute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    /// Returns the sub-configurations in insertion order.
    pub fn children(&self) -> &[(String, Configuration)] {
        &self.children
    }

    /// Returns the sub-configuration stored under `key`.
    pub fn child(&self, key: &str) -> Option<&Configuration> {
        self.children
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, config)| config)
    }

    /// Attaches a sub-configuration, replacing any existing one under `key`
    /// in place (order is kept).
    pub fn insert_child(&mut self, key: impl Into<String>, child: Configuration) {
        let key = key.into();
        match self.children.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = child,
            None => self.children.push((key, child)),
        }
    }

    /// True if there are no attributes and no sub-configurations.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    /// True if `[[VAR]]` substitution is enabled.
    pub fn substitutes(&self) -> bool {
        self.substitute
    }

    /// Enables or disables substitution.
    pub fn set_substitute(&mut self, substitute: bool) {
        self.substitute = substitute;
    }

    /// Returns the provider metadata, if this node was fetched or registered.
    pub fn provider_data(&self) -> Option<&ProviderData> {
        self.provider_data.as_ref()
    }

    /// Attaches provider metadata.
    pub fn set_provider_data(&mut self, data: ProviderData) {
        self.provider_data = Some(data);
    }

    /// Builder form of [`set_provider_data`](Self::set_provider_data).
    pub fn with_provider_data(mut self, data: ProviderData) -> Self {
        self.provider_data = Some(data);
        self
    }
}

impl Default for Configuration {
    /// An unnamed, empty configuration with substitution enabled.
    fn default() -> Self {
        Self::new("")
    }
}

// =============================================================================
// Substitution
// =============================================================================

/// Expands `[[NAME]]` references in every string inside `value`.
///
/// Unknown names and unterminated `[[` are left untouched.
pub fn substitute_value(value: &Value, lookup: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, lookup)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, lookup)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_str(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("[[") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("]]") else {
            break;
        };

        let name = &after_open[..end];
        out.push_str(&rest[..start]);
        match lookup(name) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOST" => Some("db.local".to_string()),
            "PORT" => Some("5432".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_default_matches_new() {
        let config = Configuration::default();
        assert!(config.substitutes());
        assert_eq!(config, Configuration::new(""));
    }

    #[test]
    fn test_substitution_expands_known_names() {
        let value = json!("[[HOST]]:[[PORT]]");
        assert_eq!(substitute_value(&value, &lookup), json!("db.local:5432"));
    }

    #[test]
    fn test_substitution_leaves_unknown_and_unterminated() {
        assert_eq!(substitute_value(&json!("[[NOPE]]"), &lookup), json!("[[NOPE]]"));
        assert_eq!(substitute_value(&json!("x [[HOST"), &lookup), json!("x [[HOST"));
        assert_eq!(substitute_value(&json!(7), &lookup), json!(7));
    }

    #[test]
    fn test_substitution_recurses_into_nested_values() {
        let value = json!({"conn": {"host": "[[HOST]]"}, "list": ["[[PORT]]"]});
        assert_eq!(
            substitute_value(&value, &lookup),
            json!({"conn": {"host": "db.local"}, "list": ["5432"]})
        );
    }

    #[test]
    fn test_resolve_respects_substitute_flag() {
        std::env::set_var("ZKCONF_CORE_TEST_VAR", "expanded");
        let mut attrs = Map::new();
        attrs.insert("k".into(), json!("[[ZKCONF_CORE_TEST_VAR]]"));

        let on = Configuration::from_record("c", attrs.clone(), true);
        assert_eq!(on.resolve("k"), Some(json!("expanded")));
        assert_eq!(on.get("k"), Some(&json!("[[ZKCONF_CORE_TEST_VAR]]")));

        let off = Configuration::from_record("c", attrs, false);
        assert_eq!(off.resolve("k"), Some(json!("[[ZKCONF_CORE_TEST_VAR]]")));
    }

    #[test]
    fn test_children_keep_insertion_order_and_replace_in_place() {
        let mut config = Configuration::new("blocks");
        config.insert_child("b", Configuration::new("b"));
        config.insert_child("a", Configuration::new("a"));
        config.insert_child("b", Configuration::with_data("b", Map::new()).with_provider_data(
            ProviderData::leaf(NodePath::parse("/x/b").unwrap()),
        ));

        let names: Vec<&str> = config.children().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(config.child("b").unwrap().provider_data().is_some());
    }

    #[test]
    fn test_provider_data_is_out_of_band() {
        let config = Configuration::new("c")
            .with_provider_data(ProviderData::container(NodePath::parse("/r/1/c").unwrap()));
        assert!(config.attributes().is_empty());
        assert!(config.provider_data().unwrap().is_container);
    }
}
