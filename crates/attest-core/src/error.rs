//! Error types for the Attest intake client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the intake subsystem.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The variants mirror the
/// failure classes of the intake flow: local validation, a submission
/// already in flight, backend rejections, transport faults, and storage
/// faults in the durable cache.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AttestError {
    /// Local validation failure. No network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A step-advancement call is already in flight for this session.
    #[error("A submission is already in flight for this session")]
    Busy,

    /// The backend rejected the request or failed server-side.
    #[error("API error: {message}")]
    Api {
        /// HTTP status code, if the response got far enough to carry one.
        status: Option<u16>,
        message: String,
        /// Whether retrying the same request may succeed.
        retryable: bool,
    },

    /// The request never produced a usable response (connect, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// Durable cache / file system error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AttestError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Api error
    pub fn api(status: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Api {
            status,
            message: message.into(),
            retryable,
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Busy error
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if retrying the same request may succeed.
    ///
    /// Returns true for transport faults and for API errors the backend
    /// classified as retryable (rate limits, gateway errors). Validation
    /// and Busy errors are never retryable as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AttestError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for AttestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, AttestError>`.
pub type Result<T> = std::result::Result<T, AttestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AttestError::transport("connection refused").is_retryable());
        assert!(AttestError::api(Some(503), "unavailable", true).is_retryable());
        assert!(!AttestError::api(Some(400), "bad request", false).is_retryable());
        assert!(!AttestError::validation("missing category").is_retryable());
        assert!(!AttestError::Busy.is_retryable());
    }

    #[test]
    fn io_error_converts_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AttestError = io.into();
        assert!(matches!(err, AttestError::Storage(_)));
    }
}
