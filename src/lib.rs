// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot - waste collection node
//!
//! Fuses vision detections and load cell readings into disposal events and
//! accounts them into durable work periods held by a remote ledger, with
//! best-effort telemetry on a message bus.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! ecobot = "0.1"  # Default: full collection node
//! ```
//!
//! ## Feature Flags
//!
//! - **`node`** (default): ledger client, bus publisher, period lifecycle and ingest pipeline
//! - **`file-logging`**: rotating log files next to console output
//!
//! Without `node` only the pure parts remain: data structures, configuration,
//! logging setup and the correlator.
//!
//! ## Usage
//!
//! ```rust
//! use ecobot::prelude::*;
//!
//! let correlator = EventCorrelator::new(CorrelatorConfig::default());
//! let now = chrono::Utc::now();
//! correlator.on_detection(&DetectionFrame::single(DetectedClass::Can, 0.87, now).unwrap());
//! let events = correlator.on_weight(&WeightSample::new(15.0, now).unwrap());
//! assert_eq!(events[0].category, WasteCategory::Can);
//! ```

pub use ecobot_config as config;
pub use ecobot_correlator as correlator;
pub use ecobot_observability as observability;
pub use ecobot_structures as structures;

#[cfg(feature = "node")]
pub use ecobot_agent as agent;
#[cfg(feature = "node")]
pub use ecobot_ledger as ledger;
#[cfg(feature = "node")]
pub use ecobot_services as services;
#[cfg(feature = "node")]
pub use ecobot_transports as transports;

/// Common imports
pub mod prelude {
    pub use crate::config::{load_config, validate_config, EcobotConfig};
    pub use crate::correlator::{CorrelatorConfig, EventCorrelator};
    pub use crate::structures::*;

    #[cfg(feature = "node")]
    pub use crate::agent::{spawn_ingest, CollectionPipeline, IngestSenders};
    #[cfg(feature = "node")]
    pub use crate::ledger::{HttpLedgerClient, InMemoryLedger, RemoteLedger, RetryPolicy};
    #[cfg(feature = "node")]
    pub use crate::services::{PeriodLifecycleManager, PeriodPhase};
    #[cfg(feature = "node")]
    pub use crate::transports::{PublishOutcome, ResilientPublisher};
}

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
