//! # Store Connection
//!
//! The interface every coordination-service backend implements.
//!
//! ## Connection States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session State Transitions                            │
//! │                                                                         │
//! │  ┌────────────┐   network blip   ┌────────────┐                        │
//! │  │ Connected  │ ───────────────► │ Suspended  │                        │
//! │  └────────────┘ ◄─────────────── └─────┬──────┘                        │
//! │        ▲          reconnected          │ session expired               │
//! │        │                               ▼                                │
//! │        │                         ┌────────────┐                        │
//! │        └──────── new session ─── │    Lost    │                        │
//! │                                  └────────────┘                        │
//! │                                                                         │
//! │  Transitions are published on a broadcast channel. zkconf only         │
//! │  observes them; reconnecting is the backend's job.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use tokio::sync::broadcast;
use zkconf_core::NodePath;

use crate::error::{StoreError, StoreResult};

/// Session state reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Session established and usable.
    Connected,
    /// Connection dropped; the session may still recover.
    Suspended,
    /// Session expired or closed; ephemeral state is gone.
    Lost,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Suspended => write!(f, "suspended"),
            ConnectionState::Lost => write!(f, "lost"),
        }
    }
}

/// Primitive operations against a hierarchical key-store.
///
/// ## Absence Semantics
/// - `list_children` / `read` return `Ok(None)` for an absent node
/// - `update` / `delete_recursive` return [`StoreError::NoNode`]
/// - `create` returns [`StoreError::NodeExists`] if the node is present and
///   creates missing ancestors with empty payloads
///
/// Every call is one request/response round-trip. Implementations do not
/// retry on behalf of the caller.
pub trait StoreConnection: Send + Sync + 'static {
    /// Opens the session. Calls after the first successful one are no-ops.
    fn connect(&self, address: &str, port: u16) -> impl Future<Output = StoreResult<()>> + Send;

    /// Closes the session. A no-op if not connected.
    fn disconnect(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Creates `path` and any missing ancestors with empty payloads.
    fn ensure_path(&self, path: &NodePath) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lists child names in store order, or `None` if the node is absent.
    fn list_children(
        &self,
        path: &NodePath,
    ) -> impl Future<Output = StoreResult<Option<Vec<String>>>> + Send;

    /// Reads the node payload, or `None` if the node is absent.
    fn read(&self, path: &NodePath) -> impl Future<Output = StoreResult<Option<Vec<u8>>>> + Send;

    /// Creates a node holding `data`.
    fn create(&self, path: &NodePath, data: &[u8]) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites the payload of an existing node.
    fn update(&self, path: &NodePath, data: &[u8]) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a node and all of its descendants.
    fn delete_recursive(&self, path: &NodePath) -> impl Future<Output = StoreResult<()>> + Send;

    /// Subscribes to session state transitions.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionState>;

    /// Creates the node, or overwrites it if it already exists.
    fn create_or_update(
        &self,
        path: &NodePath,
        data: &[u8],
    ) -> impl Future<Output = StoreResult<()>> + Send {
        async move {
            match self.create(path, data).await {
                Err(StoreError::NodeExists { .. }) => self.update(path, data).await,
                other => other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Suspended.to_string(), "suspended");
        assert_eq!(ConnectionState::Lost.to_string(), "lost");
    }
}
