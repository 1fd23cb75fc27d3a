//! Core traits for response-service clients
//!
//! The trait lives in core so the orchestrator can be driven by any client;
//! HTTP implementations live in the vendors crate.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::request::CompletionRequest;

// ============================================================================
// Response Client Trait
// ============================================================================

/// Client for the external generative-response service
///
/// Implementations handle vendor-specific API details while presenting a
/// single text-in, text-out call to the task executor.
#[async_trait]
pub trait ResponseClient: Send + Sync {
    /// Vendor identifier (e.g., "anthropic", "openai")
    fn vendor_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Send one request and return the response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError>;
}

/// Client-side errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network or transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the service
    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited {
        /// Suggested retry delay
        retry_after: Option<Duration>,
    },

    /// Request rejected as invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response parsed but carried no text
    #[error("Response contained no text")]
    EmptyResponse,

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Convert to ErrorKind for error-marked results
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            ClientError::MalformedResponse(_) | ClientError::EmptyResponse => {
                ErrorKind::CallMalformed
            }
            ClientError::Transport(_)
            | ClientError::Auth(_)
            | ClientError::RateLimited { .. }
            | ClientError::InvalidRequest(_)
            | ClientError::ServerError { .. }
            | ClientError::Timeout(_)
            | ClientError::Config(_) => ErrorKind::CallFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_to_error_kind() {
        assert_eq!(
            ClientError::Auth("bad key".into()).to_error_kind(),
            ErrorKind::CallFailed
        );
        assert_eq!(
            ClientError::RateLimited { retry_after: None }.to_error_kind(),
            ErrorKind::CallFailed
        );
        assert_eq!(
            ClientError::ServerError {
                status: 529,
                message: "overloaded".into()
            }
            .to_error_kind(),
            ErrorKind::CallFailed
        );
        assert_eq!(
            ClientError::Timeout(Duration::from_secs(30)).to_error_kind(),
            ErrorKind::CallFailed
        );
        assert_eq!(
            ClientError::MalformedResponse("missing content".into()).to_error_kind(),
            ErrorKind::CallMalformed
        );
        assert_eq!(
            ClientError::EmptyResponse.to_error_kind(),
            ErrorKind::CallMalformed
        );
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::ServerError {
            status: 500,
            message: "Internal error".into(),
        };
        assert_eq!(err.to_string(), "Server error: 500 - Internal error");
    }
}
