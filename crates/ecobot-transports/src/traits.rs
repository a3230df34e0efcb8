// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions

use crate::error::TransportResult;
use async_trait::async_trait;

/// Topic-addressed, one-way message sink (publish side of pub/sub)
#[async_trait]
pub trait BusTransport: Send {
    /// Send one message on `topic`
    async fn send(&mut self, topic: &str, payload: Vec<u8>) -> TransportResult<()>;

    /// Release the underlying connection. Calling it twice is harmless.
    async fn close(&mut self) -> TransportResult<()>;

    /// Get transport name/type
    fn transport_type(&self) -> &str;
}
