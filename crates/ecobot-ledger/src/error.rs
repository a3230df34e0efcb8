// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ledger calls

/// Result type alias using LedgerError
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Errors returned by the remote accounting service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Could not reach the service
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The service answered with an error status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered 2xx but the body is not what was expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be built from its configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    /// Check if the call may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Network(_) | LedgerError::Timeout(_) => true,
            LedgerError::Status { status, .. } => *status >= 500 || *status == 429,
            LedgerError::InvalidResponse(_) | LedgerError::InvalidConfig(_) => false,
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LedgerError::Timeout(err.to_string())
        } else if err.is_decode() {
            LedgerError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            LedgerError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            LedgerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::InvalidResponse(err.to_string())
    }
}
