//! # Store Error Types
//!
//! Error types for coordination-service operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Client error (zookeeper-client / MemoryStore)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the path and categorization           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TreeSync                                                              │
//! │       ├── NoNode on list/read  → recovered as "no data"                │
//! │       ├── NodeExists on create → recovered as update                   │
//! │       └── everything else      → ProviderError::Store → caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Coordination-service operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The node does not exist.
    ///
    /// ## When This Occurs
    /// - `update` or `delete_recursive` on an absent path
    /// - Removing the same configuration twice
    #[error("Node not found: {path}")]
    NoNode { path: String },

    /// The node already exists.
    ///
    /// ## When This Occurs
    /// - `create` on a path that is already present
    #[error("Node already exists: {path}")]
    NodeExists { path: String },

    /// The session is not usable (never connected, suspended, lost, or closed).
    #[error("Connection to store unavailable: {0}")]
    ConnectionLoss(String),

    /// The session could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The store refused the operation (e.g. deleting the root).
    #[error("Invalid operation on {path}: {reason}")]
    InvalidOperation { path: String, reason: String },

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NoNode error for `path`.
    pub fn no_node(path: impl Into<String>) -> Self {
        StoreError::NoNode { path: path.into() }
    }

    /// Creates a NodeExists error for `path`.
    pub fn node_exists(path: impl Into<String>) -> Self {
        StoreError::NodeExists { path: path.into() }
    }

    /// Returns true if the node was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NoNode { .. })
    }

    /// Returns true if the failure came from the session, not the data.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionLoss(_) | StoreError::ConnectionFailed(_)
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(StoreError::no_node("/a").is_not_found());
        assert!(!StoreError::node_exists("/a").is_not_found());
        assert!(StoreError::ConnectionLoss("suspended".into()).is_connection_error());
        assert!(StoreError::ConnectionFailed("refused".into()).is_connection_error());
        assert!(!StoreError::Internal("boom".into()).is_connection_error());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::no_node("/r/1/x").to_string(), "Node not found: /r/1/x");
        assert_eq!(
            StoreError::node_exists("/r/1/x").to_string(),
            "Node already exists: /r/1/x"
        );
    }
}
