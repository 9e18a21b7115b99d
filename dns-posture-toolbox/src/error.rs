//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Toolbox error type.
///
/// "No such record" is not an error: resolvers report it as
/// [`LookupOutcome::NotFound`](crate::LookupOutcome::NotFound).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// Malformed input (domain name, selector, command argument).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A DNS query did not answer within the configured timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transport or server failure (SERVFAIL, refused, connection errors).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Attempted to run a program that is not on the allow-list.
    #[error("Unsafe command rejected: {0}")]
    UnsafeCommand(String),

    /// An allow-listed program failed, timed out, or exceeded the output cap.
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl ToolboxError {
    /// Transient failures that are worth another attempt.
    ///
    /// Timeouts and server failures are retried; validation and sandbox
    /// violations never are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::NetworkError(_))
    }
}

/// Toolbox Result type alias
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn retryable_timeout() {
        assert!(ToolboxError::Timeout("q".into()).is_retryable());
    }

    #[test]
    fn retryable_network_error() {
        assert!(ToolboxError::NetworkError("servfail".into()).is_retryable());
    }

    #[test]
    fn not_retryable_validation() {
        assert!(!ToolboxError::ValidationError("bad".into()).is_retryable());
    }

    #[test]
    fn not_retryable_unsafe_command() {
        assert!(!ToolboxError::UnsafeCommand("rm".into()).is_retryable());
    }

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(ToolboxError::Timeout("example.com TXT".into())).unwrap();
        assert_eq!(json["code"], "Timeout");
        assert_eq!(json["details"], "example.com TXT");
    }
}
