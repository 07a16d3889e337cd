//! # zkconf-store: Coordination Service Layer
//!
//! The boundary between zkconf and the hierarchical key-store. Everything
//! above this crate talks to the store through [`StoreConnection`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        zkconf Data Flow                                 │
//! │                                                                         │
//! │  TreeSync (zkconf-provider)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   zkconf-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────────┐        ┌──────────────┐  ┌───────────┐ │   │
//! │  │   │ StoreConnection  │◄───────│ MemoryStore  │  │  ZkStore  │ │   │
//! │  │   │ (connection.rs)  │        │ (memory.rs)  │  │ (feature) │ │   │
//! │  │   │                  │◄──────────────────────────│           │ │   │
//! │  │   │ list / read      │        │ tests and    │  │ zookeeper │ │   │
//! │  │   │ create / update  │        │ embedding    │  │ -client   │ │   │
//! │  │   │ delete / events  │        └──────────────┘  └───────────┘ │   │
//! │  │   └──────────────────┘                                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Coordination service (ZooKeeper)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`connection`] - The `StoreConnection` trait and connection states
//! - [`memory`] - In-memory hierarchical store
//! - `zookeeper` - ZooKeeper backend (`zookeeper` feature)
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zkconf_store::{MemoryStore, StoreConnection};
//!
//! let store = MemoryStore::new();
//! store.connect("127.0.0.1", 2181).await?;
//! store.create_or_update(&path, br#"{"x":1}"#).await?;
//! let bytes = store.read(&path).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod connection;
pub mod error;
pub mod memory;

#[cfg(feature = "zookeeper")]
pub mod zookeeper;

// =============================================================================
// Re-exports
// =============================================================================

pub use connection::{ConnectionState, StoreConnection};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

#[cfg(feature = "zookeeper")]
pub use zookeeper::ZkStore;
