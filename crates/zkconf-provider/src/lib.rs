//! # zkconf-provider: Configuration Provider for zkconf
//!
//! Loads, registers, saves, and removes named configuration trees kept in a
//! hierarchical coordination service such as ZooKeeper.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Provider Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │             StoreConfigurationProvider (per caller)              │  │
//! │  │                                                                  │  │
//! │  │  fetch / register / save / remove                               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         TreeSync                                 │  │
//! │  │                                                                  │  │
//! │  │  path mapping, one-level fetch, payload encode/decode           │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │              StoreSession (one per process)                      │  │
//! │  │                                                                  │  │
//! │  │  SharedSession cell, root path, shard mappings, state monitor   │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                  StoreConnection (ZkStore / MemoryStore)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Provider settings (TOML file, environment overrides)
//! - [`error`] - Provider error types
//! - [`provider`] - `ConfigurationProvider` trait and store-backed impl
//! - [`session`] - Process-wide store session
//! - [`sync`] - Tree fetch/register/save/remove
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zkconf_provider::{ConfigurationProvider, ProviderSettings, SharedSession,
//!                       StoreConfigurationProvider};
//! use zkconf_store::ZkStore;
//!
//! static SESSION: SharedSession<ZkStore> = SharedSession::new();
//!
//! let settings = ProviderSettings::load_or_default(None);
//! let provider = StoreConfigurationProvider::new(&SESSION, &settings, ZkStore::new).await?;
//!
//! let blocks = provider.fetch("blocks", true).await?;
//! for (name, child) in blocks.children() {
//!     println!("{}: {:?}", name, child.attributes());
//! }
//!
//! // During orderly shutdown
//! SESSION.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod sync;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{MappingsSetting, ProviderSettings};
pub use error::{ProviderError, ProviderResult};
pub use provider::{ConfigurationProvider, StoreConfigurationProvider};
pub use session::{NoOpListener, SessionListener, SharedSession, StoreSession};
pub use sync::TreeSync;
