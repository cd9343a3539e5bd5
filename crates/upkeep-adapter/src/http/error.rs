/*
[INPUT]:  Error sources (HTTP, API, serialization, auth)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the upkeep adapter
#[derive(Error, Debug)]
pub enum UpkeepError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// Server refused the credentials or the token
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No token available for an authenticated endpoint
    #[error("Not signed in, please log in first")]
    AuthRequired,

    /// Token is expired
    #[error("Session token expired, please log in again")]
    TokenExpired,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    /// Connection timeout
    #[error("Connection timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl UpkeepError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            UpkeepError::Http(err) => !err.is_decode() && !err.is_builder(),
            UpkeepError::Api { code, .. } => *code >= 500,
            UpkeepError::RateLimit { .. } | UpkeepError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            UpkeepError::RateLimit { retry_after } => Some(*retry_after),
            UpkeepError::Timeout { .. } => Some(1),
            _ => None,
        }
    }

    /// Check if error indicates the operator must sign in again
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            UpkeepError::Authentication { .. }
                | UpkeepError::AuthRequired
                | UpkeepError::TokenExpired
        )
    }

    /// Check if the transport gave up waiting
    pub fn is_timeout(&self) -> bool {
        match self {
            UpkeepError::Timeout { .. } => true,
            UpkeepError::Http(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Create an error from a non-success status code and message
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => UpkeepError::TokenExpired,
            StatusCode::FORBIDDEN => UpkeepError::Authentication { message },
            _ => UpkeepError::api_error(status, message),
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        UpkeepError::Api {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Result type alias for upkeep adapter operations
pub type Result<T> = std::result::Result<T, UpkeepError>;
