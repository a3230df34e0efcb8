// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Best-effort telemetry publisher.
//!
//! The mode is decided once, at construction: if the bus cannot be reached the
//! publisher stays disabled for its whole lifetime and every publish is a
//! no-op. Publish failures are reported to the caller as an outcome, never as
//! an error that could unwind collection state.

use crate::error::TransportError;
use crate::traits::BusTransport;
use crate::zmq::ZmqBusTransport;
use ecobot_config::BusConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Result of a single publish call
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// Handed to the transport
    Sent,
    /// Publisher is disabled or closed; nothing was attempted
    Skipped,
    /// Delivery was attempted and failed
    Failed(TransportError),
}

impl PublishOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PublishOutcome::Sent)
    }
}

/// Message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    prototype_id: &'a str,
    #[serde(flatten)]
    payload: &'a T,
}

enum Mode {
    Enabled(Mutex<Option<Box<dyn BusTransport>>>),
    Disabled { reason: String },
}

pub struct ResilientPublisher {
    mode: Mode,
    device_id: String,
    default_topic: String,
    publish_timeout: Duration,
    closed: AtomicBool,
    sent: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl ResilientPublisher {
    /// Connect to the configured bus. Never fails: an unreachable bus yields a
    /// disabled publisher.
    pub async fn connect(config: &BusConfig, device_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        match ZmqBusTransport::connect(&config.endpoint, config.connect_timeout()).await {
            Ok(transport) => {
                info!("[PUBLISHER] Publishing to {}", config.endpoint);
                Self::from_transport(
                    Box::new(transport),
                    device_id,
                    &config.default_topic,
                    config.publish_timeout(),
                )
            }
            Err(e) => {
                warn!(
                    "[PUBLISHER] Bus {} unreachable ({}); telemetry publishing disabled",
                    config.endpoint, e
                );
                Self::disabled(device_id, &config.default_topic, e.to_string())
            }
        }
    }

    /// Wrap an already connected transport
    pub fn from_transport(
        transport: Box<dyn BusTransport>,
        device_id: impl Into<String>,
        default_topic: &str,
        publish_timeout: Duration,
    ) -> Self {
        Self::with_mode(
            Mode::Enabled(Mutex::new(Some(transport))),
            device_id.into(),
            default_topic,
            publish_timeout,
        )
    }

    /// Publisher that never sends
    pub fn disabled(device_id: impl Into<String>, default_topic: &str, reason: impl Into<String>) -> Self {
        Self::with_mode(
            Mode::Disabled {
                reason: reason.into(),
            },
            device_id.into(),
            default_topic,
            Duration::from_secs(1),
        )
    }

    fn with_mode(mode: Mode, device_id: String, default_topic: &str, publish_timeout: Duration) -> Self {
        Self {
            mode,
            device_id,
            default_topic: default_topic.to_string(),
            publish_timeout,
            closed: AtomicBool::new(false),
            sent: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Enabled(_)) && !self.closed.load(Ordering::Acquire)
    }

    /// Why the publisher is disabled, if it is
    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.mode {
            Mode::Disabled { reason } => Some(reason),
            Mode::Enabled(_) => None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn stats(&self) -> PublisherStats {
        PublisherStats {
            sent: self.sent.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Publish `payload` with the device id attached
    ///
    /// `payload` must serialize to a JSON object; its fields are flattened
    /// next to `prototype_id`. An empty `topic` uses the default topic.
    pub async fn publish<T: Serialize>(&self, payload: &T, topic: &str) -> PublishOutcome {
        let transport = match &self.mode {
            Mode::Enabled(transport) if !self.closed.load(Ordering::Acquire) => transport,
            _ => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return PublishOutcome::Skipped;
            }
        };

        let topic = if topic.is_empty() {
            self.default_topic.as_str()
        } else {
            topic
        };

        let body = match serde_json::to_vec(&Envelope {
            prototype_id: &self.device_id,
            payload,
        }) {
            Ok(body) => body,
            Err(e) => return self.record_failure(topic, e.into()),
        };

        let result = timeout(self.publish_timeout, async {
            let mut guard = transport.lock().await;
            match guard.as_mut() {
                Some(transport) => transport.send(topic, body).await,
                None => Err(TransportError::NotRunning),
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                debug!("[PUBLISHER] Sent message on '{}'", topic);
                PublishOutcome::Sent
            }
            Ok(Err(TransportError::NotRunning)) => {
                // Lost a race with close()
                self.skipped.fetch_add(1, Ordering::Relaxed);
                PublishOutcome::Skipped
            }
            Ok(Err(e)) => self.record_failure(topic, e),
            Err(_) => self.record_failure(topic, TransportError::Timeout),
        }
    }

    fn record_failure(&self, topic: &str, error: TransportError) -> PublishOutcome {
        self.failed.fetch_add(1, Ordering::Relaxed);
        warn!("[PUBLISHER] Failed to publish on '{}': {}", topic, error);
        PublishOutcome::Failed(error)
    }

    /// Tear down the transport. Idempotent, safe on a disabled publisher.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Mode::Enabled(transport) = &self.mode {
            let mut guard = transport.lock().await;
            if let Some(mut transport) = guard.take() {
                if let Err(e) = transport.close().await {
                    warn!("[PUBLISHER] Error while closing {}: {}", transport.transport_type(), e);
                }
                info!("[PUBLISHER] Closed");
            }
        }
    }
}
