// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Detection/weight fusion.
//!
//! Detections and weight readings come from independent polling loops with no
//! shared clock. A weight increase is attributed to the most recent detection
//! if and only if it arrives within the expiry window. The whole state sits
//! behind one lock so that confirming a detection reads and clears it
//! atomically.

use crate::state::{elapsed_between, CorrelationState};
use chrono::{DateTime, Utc};
use ecobot_config::CorrelationConfig;
use ecobot_structures::{DetectedClass, DetectionFrame, DisposalEvent, WasteCategory, WeightSample};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Fusion parameters, immutable after construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelatorConfig {
    /// Minimum weight increase (grams) that confirms a pending detection
    pub weight_threshold_g: f64,
    pub expiry_window: Duration,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            weight_threshold_g: 5.0,
            expiry_window: Duration::from_secs(10),
        }
    }
}

impl From<&CorrelationConfig> for CorrelatorConfig {
    fn from(config: &CorrelationConfig) -> Self {
        Self {
            weight_threshold_g: config.weight_threshold_g,
            expiry_window: config.expiry_window(),
        }
    }
}

/// Fuses detection frames and weight samples into disposal events
///
/// Both entry points are short and CPU-only; callers dispatch side effects for
/// the returned events after the call returns.
pub struct EventCorrelator {
    config: CorrelatorConfig,
    state: Mutex<CorrelationState>,
}

impl EventCorrelator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CorrelationState::default()),
        }
    }

    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Copy of the current decision state
    pub fn snapshot(&self) -> CorrelationState {
        *self.state.lock()
    }

    /// Record a detection frame
    ///
    /// An empty frame only expires stale state.
    pub fn on_detection(&self, frame: &DetectionFrame) {
        let now = frame.observed_at;
        let mut state = self.state.lock();

        self.expire_stale(&mut state, now, "before new detection");

        // No category to attribute: treated like a malformed sample, so it
        // neither sets flags nor extends an open window
        if frame.is_empty() {
            debug_assert!(state.holds_invariant());
            return;
        }

        if frame.is_ambiguous() {
            state.set_pending(WasteCategory::Pet);
            state.set_pending(WasteCategory::Can);
        } else {
            match frame.primary_class() {
                Some(DetectedClass::Pet) => state.set_pending(WasteCategory::Pet),
                Some(DetectedClass::Can) => state.set_pending(WasteCategory::Can),
                Some(DetectedClass::Mixed) => {
                    state.set_pending(WasteCategory::Pet);
                    state.set_pending(WasteCategory::Can);
                }
                None => {}
            }
        }
        state.last_detection_at = Some(now);

        debug!(
            "[CORRELATOR] Detection of {} object(s) -> pending_pet={}, pending_can={}",
            frame.object_count(),
            state.pending_pet,
            state.pending_can
        );
        debug_assert!(state.holds_invariant());
    }

    /// Record a weight sample, returning the disposals it confirms
    pub fn on_weight(&self, sample: &WeightSample) -> Vec<DisposalEvent> {
        let now = sample.observed_at;
        let mut state = self.state.lock();

        self.expire_stale(&mut state, now, "without weight change");

        let delta = sample.weight_g - state.last_weight;
        let mut confirmed = Vec::new();

        if delta >= self.config.weight_threshold_g && state.has_pending() {
            if let Some(detected_at) = state.last_detection_at {
                if elapsed_between(detected_at, now) <= self.config.expiry_window {
                    for category in state.pending_categories() {
                        info!("[CORRELATOR] +1 {} (delta weight={:.2}g)", category, delta);
                        confirmed.push(DisposalEvent::new(category, now));
                        state.clear_pending(category);
                    }
                }
            }
        }

        state.last_weight = sample.weight_g;
        debug_assert!(state.holds_invariant());
        confirmed
    }

    fn expire_stale(&self, state: &mut CorrelationState, now: DateTime<Utc>, context: &str) {
        if state.is_expired(now, self.config.expiry_window) {
            debug!("[CORRELATOR] Pending detection expired {}", context);
            state.clear_all_pending();
        }
    }
}

impl Default for EventCorrelator {
    fn default() -> Self {
        Self::new(CorrelatorConfig::default())
    }
}
