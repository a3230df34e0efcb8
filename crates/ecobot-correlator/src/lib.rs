// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-correlator
//!
//! Fuses vision detections and load cell readings into confirmed
//! [`DisposalEvent`](ecobot_structures::DisposalEvent)s.
//!
//! ```rust
//! use chrono::Utc;
//! use ecobot_correlator::{CorrelatorConfig, EventCorrelator};
//! use ecobot_structures::{DetectedClass, DetectionFrame, WeightSample};
//!
//! let correlator = EventCorrelator::new(CorrelatorConfig::default());
//! let now = Utc::now();
//! correlator.on_detection(&DetectionFrame::single(DetectedClass::Pet, 0.92, now).unwrap());
//! let events = correlator.on_weight(&WeightSample::new(18.0, now).unwrap());
//! assert_eq!(events.len(), 1);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod correlator;
pub mod state;

pub use correlator::{CorrelatorConfig, EventCorrelator};
pub use state::CorrelationState;
