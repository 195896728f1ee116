//! Completion service error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the completion service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Response has no choices")]
    MissingChoices,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500 || *status == 408,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) | LlmError::MissingChoices | LlmError::Json(_) => false,
        }
    }

    /// Whether the failure happened below the HTTP response layer
    ///
    /// Everything else means the service answered with something unusable.
    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::Network(_))
    }
}
