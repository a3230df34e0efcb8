// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ PUB transport
//!
//! Connects to a broker/proxy (XSUB side) and sends two-frame messages:
//! `[topic, payload]`.

use crate::error::{TransportError, TransportResult};
use crate::traits::BusTransport;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};
use zeromq::{PubSocket, Socket, SocketSend, ZmqMessage};

pub struct ZmqBusTransport {
    endpoint: String,
    socket: Option<PubSocket>,
}

impl ZmqBusTransport {
    /// Connect a PUB socket to `endpoint`, giving up after `connect_timeout`
    pub async fn connect(endpoint: &str, connect_timeout: Duration) -> TransportResult<Self> {
        let mut socket = PubSocket::new();

        timeout(connect_timeout, socket.connect(endpoint))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        info!("[ZMQ-PUB] Connected to {}", endpoint);

        Ok(Self {
            endpoint: endpoint.to_string(),
            socket: Some(socket),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BusTransport for ZmqBusTransport {
    async fn send(&mut self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotRunning)?;

        let mut message = ZmqMessage::from(payload);
        message.prepend(&ZmqMessage::from(topic.as_bytes().to_vec()));

        socket.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        if self.socket.take().is_some() {
            debug!("[ZMQ-PUB] Closed connection to {}", self.endpoint);
        }
        Ok(())
    }

    fn transport_type(&self) -> &str {
        "zmq-pub"
    }
}
