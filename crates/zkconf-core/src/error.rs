//! # Error Types
//!
//! Error types for zkconf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  zkconf-core errors (this file)                                        │
//! │  └── CoreError        - Mappings, paths, payloads                      │
//! │                                                                         │
//! │  zkconf-store errors (separate crate)                                  │
//! │  └── StoreError       - Coordination service failures                  │
//! │                                                                         │
//! │  zkconf-provider errors                                                │
//! │  └── ProviderError    - What provider callers see                      │
//! │                                                                         │
//! │  Flow: CoreError / StoreError → ProviderError → caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure mapping, path, and payload logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The mapping table could not be parsed into `name → shard` pairs.
    ///
    /// ## When This Occurs
    /// - The raw mapping string is not valid JSON
    /// - The JSON is valid but not an object
    #[error("Invalid shard mappings: {0}")]
    InvalidMappings(String),

    /// A mapping value is not a usable shard token.
    ///
    /// Only strings and integers can be rendered into a path segment.
    #[error("Invalid shard token for '{name}': {reason}")]
    InvalidShardToken { name: String, reason: String },

    /// A store path does not follow the `/a/b/c` grammar.
    #[error("Invalid node path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A single path segment (name or shard token) is unusable.
    #[error("Invalid path segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: String },

    /// A node payload could not be decoded into an attribute map.
    ///
    /// ## When This Occurs
    /// - Bytes are not UTF-8
    /// - Bytes are not JSON
    /// - JSON is not an object (arrays, strings, numbers)
    #[error("Malformed payload at {path}: {reason}")]
    MalformedPayload { path: String, reason: String },

    /// An attribute map could not be encoded.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

impl CoreError {
    /// Creates a MalformedPayload error for the node at `path`.
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedPayload {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidSegment error.
    pub fn invalid_segment(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidSegment {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from bad mapping input.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidMappings(_) | CoreError::InvalidShardToken { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationFailed(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::malformed("/root/1/blocks", "expected a JSON object");
        assert_eq!(
            err.to_string(),
            "Malformed payload at /root/1/blocks: expected a JSON object"
        );

        let err = CoreError::invalid_segment("a/b", "contains '/'");
        assert_eq!(err.to_string(), "Invalid path segment 'a/b': contains '/'");
    }

    #[test]
    fn test_mapping_error_category() {
        assert!(CoreError::InvalidMappings("not json".into()).is_mapping_error());
        assert!(CoreError::InvalidShardToken {
            name: "blocks".into(),
            reason: "null".into(),
        }
        .is_mapping_error());
        assert!(!CoreError::malformed("/x", "bad").is_mapping_error());
    }
}
