//! # Node Paths
//!
//! Validated store paths and the three construction rules.
//!
//! ## Path Grammar
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {root}/{shard}/{configName}[/{subName}]                               │
//! │                                                                         │
//! │  Top-level:      /nio_configuration/1/blocks                           │
//! │  Child:          /nio_configuration/1/blocks/simulate                  │
//! │  Registered:     /nio_configuration/1/blocks/simulate                  │
//! │                                                                         │
//! │  The shard is inserted once, right under root, and is keyed off the    │
//! │  TOP-LEVEL name. Sub-configurations inherit their parent's shard.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::mapping::ShardMappings;

/// An absolute `/`-separated store path.
///
/// ## Invariants
/// - Starts with `/`
/// - No trailing `/` (except the bare root `/`)
/// - No empty segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(String);

impl NodePath {
    /// The store root, `/`.
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    /// Parses and validates an absolute path.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if raw == "/" {
            return Ok(Self::root());
        }
        if raw.ends_with('/') {
            return Err(invalid("must not end with '/'"));
        }
        if raw[1..].split('/').any(str::is_empty) {
            return Err(invalid("contains an empty segment"));
        }

        Ok(NodePath(raw.to_string()))
    }

    /// Appends a single segment.
    pub fn join(&self, segment: &str) -> CoreResult<Self> {
        validate_segment(segment)?;
        if self.is_root() {
            Ok(NodePath(format!("/{}", segment)))
        } else {
            Ok(NodePath(format!("{}/{}", self.0, segment)))
        }
    }

    /// Top-level rule: `{root}/{shard(name)}/{name}`.
    pub fn top_level(&self, mappings: &ShardMappings, name: &str) -> CoreResult<Self> {
        self.join(mappings.resolve(name).as_str())?.join(name)
    }

    /// Registered sub-configuration rule:
    /// `{root}/{shard(parent)}/{parent}/{sub}`.
    pub fn registered(&self, mappings: &ShardMappings, parent: &str, sub: &str) -> CoreResult<Self> {
        self.top_level(mappings, parent)?.join(sub)
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Returns the last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Iterates the path and all of its ancestors except the root,
    /// shallowest first: `/a`, `/a/b`, `/a/b/c`.
    pub fn ancestors_and_self(&self) -> Vec<Self> {
        let mut paths = Vec::new();
        let mut current = String::new();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            paths.push(NodePath(current.clone()));
        }
        paths
    }

    /// Returns true if `other` is this path or lives underneath it.
    pub fn contains(&self, other: &NodePath) -> bool {
        if self.is_root() {
            return true;
        }
        other.0 == self.0
            || (other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }

    /// Returns true for `/`.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks that `segment` can be used as one path component.
pub fn validate_segment(segment: &str) -> CoreResult<()> {
    if segment.is_empty() {
        return Err(CoreError::invalid_segment(segment, "must not be empty"));
    }
    if segment.contains('/') {
        return Err(CoreError::invalid_segment(segment, "must not contain '/'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappings() -> ShardMappings {
        ShardMappings::from_json(r#"{"modules": "A", "default": "B"}"#).unwrap()
    }

    #[test]
    fn test_parse_validation() {
        assert!(NodePath::parse("/root").is_ok());
        assert!(NodePath::parse("/").unwrap().is_root());
        assert!(NodePath::parse("root").is_err());
        assert!(NodePath::parse("/root/").is_err());
        assert!(NodePath::parse("/root//x").is_err());
    }

    #[test]
    fn test_top_level_paths() {
        let root = NodePath::parse("/root").unwrap();
        assert_eq!(root.top_level(&mappings(), "modules").unwrap().as_str(), "/root/A/modules");
        assert_eq!(root.top_level(&mappings(), "blocks").unwrap().as_str(), "/root/B/blocks");
    }

    #[test]
    fn test_registered_path_uses_parent_shard() {
        let root = NodePath::parse("/root").unwrap();
        let path = root.registered(&mappings(), "blocks", "simulate").unwrap();
        assert_eq!(path.as_str(), "/root/B/blocks/simulate");

        let path = root.registered(&mappings(), "modules", "module1").unwrap();
        assert_eq!(path.as_str(), "/root/A/modules/module1");
    }

    #[test]
    fn test_join_onto_bare_root() {
        let path = NodePath::root().top_level(&ShardMappings::default(), "blocks").unwrap();
        assert_eq!(path.as_str(), "/1/blocks");
    }

    #[test]
    fn test_rejects_bad_segments() {
        let root = NodePath::parse("/root").unwrap();
        assert!(root.join("").is_err());
        assert!(root.join("a/b").is_err());
        assert!(root.top_level(&mappings(), "x/y").is_err());
    }

    #[test]
    fn test_parent_name_and_ancestors() {
        let path = NodePath::parse("/a/b/c").unwrap();
        assert_eq!(path.parent().unwrap().as_str(), "/a/b");
        assert_eq!(path.name(), Some("c"));
        assert_eq!(NodePath::parse("/a").unwrap().parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);

        let chain: Vec<String> = path
            .ancestors_and_self()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(chain, vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn test_contains() {
        let a = NodePath::parse("/a").unwrap();
        assert!(a.contains(&NodePath::parse("/a/b").unwrap()));
        assert!(a.contains(&a));
        assert!(!a.contains(&NodePath::parse("/ab").unwrap()));
        assert!(NodePath::root().contains(&a));
    }
}
