//! Error types for the relay layer.
//!
//! All errors are propagated via [`RelayError`] which wraps the
//! underlying [`fred`] and [`serde_json`] errors.

/// Errors that can occur in the relay layer.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A Redis operation failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
