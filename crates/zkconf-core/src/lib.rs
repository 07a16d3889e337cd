//! # zkconf-core: Pure Logic for zkconf
//!
//! Everything here is deterministic and free of I/O: the shard mapping table,
//! store path construction, the configuration tree type, and the JSON payload
//! codec. The store and provider crates build on these.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         zkconf Data Flow                                │
//! │                                                                         │
//! │  provider.fetch("blocks")                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ zkconf-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ShardMappings ──► NodePath ──► payload::decode ──► Record    │   │
//! │  │   "blocks" → "B"    /root/B/blocks   {"x":1}        Leaf/Cont. │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  zkconf-store (list children, read, create, update, delete)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`mapping`] - Shard mapping table (`name → shard token`)
//! - [`path`] - Validated store paths and the path construction rules
//! - [`configuration`] - The configuration tree and its provider data
//! - [`payload`] - JSON encode/decode of node payloads
//! - [`record`] - Fetched node shape (leaf vs container)
//! - [`error`] - Core error types
//!
//! ## Example Usage
//!
//! ```rust
//! use zkconf_core::{NodePath, ShardMappings};
//!
//! let mappings = ShardMappings::from_json(r#"{"modules": "A", "default": "B"}"#).unwrap();
//! let root = NodePath::parse("/root").unwrap();
//!
//! let path = root.top_level(&mappings, "blocks").unwrap();
//! assert_eq!(path.as_str(), "/root/B/blocks");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod configuration;
pub mod error;
pub mod mapping;
pub mod path;
pub mod payload;
pub mod record;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use configuration::{Configuration, ProviderData};
pub use error::{CoreError, CoreResult};
pub use mapping::{ShardMappings, ShardToken};
pub use path::NodePath;
pub use record::Record;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Mapping key consulted when a configuration name has no explicit entry.
pub const DEFAULT_MAPPING_KEY: &str = "default";

/// Shard used when the mapping table has no `"default"` entry either.
///
/// Lets a provider run with zero configuration.
pub const FALLBACK_SHARD: i64 = 1;

/// Attribute keys starting with this prefix are never written to the store.
pub const INTERNAL_KEY_PREFIX: char = '_';
