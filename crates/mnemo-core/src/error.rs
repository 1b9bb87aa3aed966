//! Error types for mnemo.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire mnemo workspace.
///
/// The first four variants mirror the failure taxonomy of the capture
/// workflow; the rest cover plumbing (I/O, config, transport).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MnemoError {
    /// Unrecognized identity or credential
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Malformed or empty output from the analysis service
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A file write into the backing tree failed
    #[error("Apply error at '{path}': {message}")]
    Apply { path: String, message: String },

    /// Pull/commit/push against the remote copy failed
    #[error("Sync error: {0}")]
    Sync(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or transport error talking to an external service
    #[error("Transport error: {0}")]
    Transport(String),

    /// An external operation exceeded its time bound
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// Creates an Analysis error
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// Creates an Apply error for the given tree path
    pub fn apply(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Apply {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a Sync error
    pub fn sync(message: impl Into<String>) -> Self {
        Self::Sync(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an Authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Check if this is an Analysis error
    pub fn is_analysis(&self) -> bool {
        matches!(self, Self::Analysis(_))
    }

    /// Check if this is a Sync error
    pub fn is_sync(&self) -> bool {
        matches!(self, Self::Sync(_))
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MnemoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MnemoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MnemoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for MnemoError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MnemoError>`.
pub type Result<T> = std::result::Result<T, MnemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MnemoError = io.into();
        match err {
            MnemoError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_error_is_serialization() {
        let err: MnemoError = serde_json::from_str::<serde_json::Value>("{ nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, MnemoError::Serialization { ref format, .. } if format == "JSON"));
    }

    #[test]
    fn test_predicates() {
        assert!(MnemoError::analysis("empty").is_analysis());
        assert!(MnemoError::sync("push rejected").is_sync());
        assert!(MnemoError::timeout("analysis", 60).is_timeout());
        assert!(MnemoError::not_found("session", "chat-1").is_not_found());
        assert!(!MnemoError::config("x").is_authorization());
    }
}
