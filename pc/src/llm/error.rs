//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while calling the remote generator
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

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API key not found in ${0}")]
    MissingApiKey(String),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

impl LlmError {
    /// Whether a later attempt could plausibly succeed
    ///
    /// Nothing retries automatically; this only feeds diagnostics.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::Json(_) => false,
            LlmError::MissingApiKey(_) => false,
            LlmError::Prompt(_) => false,
        }
    }
}
