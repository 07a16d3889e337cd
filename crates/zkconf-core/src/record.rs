//! # Fetched Records
//!
//! What a single fetch of a store path produced.
//!
//! ```text
//! list_children(path)
//!      │
//!      ├── non-empty ──► Container { path, children: [(name, Leaf), ...] }
//!      │
//!      └── empty/absent ► Leaf { path, attributes }
//! ```

use serde_json::{Map, Value};

use crate::configuration::{Configuration, ProviderData};
use crate::path::NodePath;

/// A fetched store node.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A node without children, holding a decoded JSON payload.
    Leaf {
        path: NodePath,
        attributes: Map<String, Value>,
    },

    /// A node with children, in the order the store returned them.
    Container {
        path: NodePath,
        children: Vec<(String, Record)>,
    },
}

impl Record {
    /// Returns the store path this record was read from.
    pub fn path(&self) -> &NodePath {
        match self {
            Record::Leaf { path, .. } | Record::Container { path, .. } => path,
        }
    }

    /// Returns true for [`Record::Container`].
    pub fn is_container(&self) -> bool {
        matches!(self, Record::Container { .. })
    }

    /// Converts the record into a configuration tree named `name`, tagging
    /// every node with its provider data.
    pub fn into_configuration(self, name: &str, substitute: bool) -> Configuration {
        match self {
            Record::Leaf { path, attributes } => {
                Configuration::from_record(name, attributes, substitute)
                    .with_provider_data(ProviderData::leaf(path))
            }
            Record::Container { path, children } => {
                let mut config = Configuration::from_record(name, Map::new(), substitute)
                    .with_provider_data(ProviderData::container(path));
                for (child_name, child) in children {
                    let child_config = child.into_configuration(&child_name, substitute);
                    config.insert_child(child_name, child_config);
                }
                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn test_leaf_into_configuration() {
        let record = Record::Leaf {
            path: path("/root/B/blocks"),
            attributes: json!({"x": 1}).as_object().cloned().unwrap(),
        };
        assert!(!record.is_container());
        assert_eq!(record.path().as_str(), "/root/B/blocks");

        let config = record.into_configuration("blocks", false);
        assert_eq!(config.name(), "blocks");
        assert_eq!(config.get("x"), Some(&json!(1)));
        let data = config.provider_data().unwrap();
        assert_eq!(data.path.as_str(), "/root/B/blocks");
        assert!(!data.is_container);
    }

    #[test]
    fn test_container_into_configuration() {
        let record = Record::Container {
            path: path("/root/B/blocks"),
            children: vec![
                (
                    "b".to_string(),
                    Record::Leaf {
                        path: path("/root/B/blocks/b"),
                        attributes: Map::new(),
                    },
                ),
                (
                    "a".to_string(),
                    Record::Leaf {
                        path: path("/root/B/blocks/a"),
                        attributes: json!({"v": 1}).as_object().cloned().unwrap(),
                    },
                ),
            ],
        };

        let config = record.into_configuration("blocks", true);
        assert!(config.provider_data().unwrap().is_container);
        assert!(config.attributes().is_empty());

        let names: Vec<&str> = config.children().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        let a = config.child("a").unwrap();
        assert_eq!(a.get("v"), Some(&json!(1)));
        assert_eq!(a.provider_data().unwrap().path.as_str(), "/root/B/blocks/a");
        assert!(a.substitutes());
    }
}
