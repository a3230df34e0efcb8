// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-transports
//!
//! Best-effort message bus publishing.
//!
//! [`ResilientPublisher`] wraps a [`BusTransport`] (ZMQ PUB by default) and
//! turns every delivery problem into a [`PublishOutcome`]. Construction never
//! fails; an unreachable bus produces a publisher in disabled mode.
//!
//! ```no_run
//! use ecobot_config::BusConfig;
//! use ecobot_transports::ResilientPublisher;
//!
//! # async fn run() {
//! let publisher = ResilientPublisher::connect(&BusConfig::default(), "bot-1").await;
//! let outcome = publisher.publish(&serde_json::json!({"weight": 12.5}), "weight").await;
//! println!("{:?}", outcome);
//! publisher.close().await;
//! # }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod publisher;
pub mod traits;
pub mod zmq;

pub use error::{TransportError, TransportResult};
pub use publisher::{PublishOutcome, PublisherStats, ResilientPublisher};
pub use traits::BusTransport;
pub use zmq::ZmqBusTransport;
