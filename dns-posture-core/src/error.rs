//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use dns_posture_toolbox::ToolboxError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Malformed domain or request input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Client exceeded its request quota for the current window
    #[error("Rate limit exceeded for {client_id}, retry in {retry_after_secs}s")]
    #[serde(rename_all = "camelCase")]
    RateLimitExceeded {
        client_id: String,
        retry_after_secs: u64,
    },

    /// Cache store I/O failure
    #[error("Cache error: {0}")]
    CacheError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid check configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Toolbox error (converting from library)
    #[error("{0}")]
    Toolbox(ToolboxError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, quota exhaustion), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_) | Self::RateLimitExceeded { .. } => true,
            Self::Toolbox(e) => matches!(e, ToolboxError::ValidationError(_)),
            Self::CacheError(_) | Self::SerializationError(_) | Self::ConfigError(_) => false,
        }
    }
}

impl From<ToolboxError> for CoreError {
    fn from(err: ToolboxError) -> Self {
        match err {
            ToolboxError::ValidationError(msg) => Self::ValidationError(msg),
            other => Self::Toolbox(other),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
