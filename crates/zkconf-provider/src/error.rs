//! # Provider Error Types
//!
//! Error types for provider operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Provider Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Core        │  │       Store             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  InvalidMappings│  │  NoNode (remove/save)   │ │
//! │  │  ConfigLoad     │  │  InvalidPath    │  │  ConnectionLoss         │ │
//! │  │  ConfigSave     │  │  Malformed      │  │  ConnectionFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Recovered locally (never surfaced):                                   │
//! │  • NoNode on fetch          → empty configuration                      │
//! │  • NodeExists on register   → overwrite                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use zkconf_core::CoreError;
use zkconf_store::StoreError;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider error type covering every failure a caller can see.
#[derive(Debug, Error)]
pub enum ProviderError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid provider settings.
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the settings file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the settings file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// Mapping, path, or payload error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Coordination-service error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ProviderError {
    fn from(err: toml::de::Error) -> Self {
        ProviderError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ProviderError {
    fn from(err: toml::ser::Error) -> Self {
        ProviderError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ProviderError {
    /// Returns true if a store node was missing (e.g. removing twice).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Store(err) if err.is_not_found())
    }

    /// Returns true if the session was unavailable.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ProviderError::Store(err) if err.is_connection_error())
    }

    /// Returns true if this error indicates a settings problem.
    pub fn is_config_error(&self) -> bool {
        match self {
            ProviderError::InvalidConfig(_)
            | ProviderError::ConfigLoadFailed(_)
            | ProviderError::ConfigSaveFailed(_) => true,
            ProviderError::Core(err) => err.is_mapping_error(),
            ProviderError::Store(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_category() {
        let err: ProviderError = StoreError::no_node("/r/1/c").into();
        assert!(err.is_not_found());
        assert!(!err.is_config_error());
        assert_eq!(err.to_string(), "Node not found: /r/1/c");
    }

    #[test]
    fn test_config_categories() {
        assert!(ProviderError::InvalidConfig("port".into()).is_config_error());
        let err: ProviderError = CoreError::InvalidMappings("not json".into()).into();
        assert!(err.is_config_error());
        let err: ProviderError = CoreError::malformed("/x", "bad").into();
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_connection_category() {
        let err: ProviderError = StoreError::ConnectionLoss("lost".into()).into();
        assert!(err.is_connection_error());
        assert!(!err.is_not_found());
    }
}
