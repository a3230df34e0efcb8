// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport error types

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-agnostic error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect the socket
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// Failed to send message
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Timeout occurred
    #[error("Operation timed out")]
    Timeout,

    /// Transport was closed
    #[error("Transport is not running")]
    NotRunning,

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<zeromq::ZmqError> for TransportError {
    fn from(err: zeromq::ZmqError) -> Self {
        Self::SendFailed(err.to_string())
    }
}
