// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pending-detection state owned by the correlator.

use chrono::{DateTime, Utc};
use ecobot_structures::WasteCategory;
use std::time::Duration;

/// Fusion decision state
///
/// `last_detection_at` is set exactly when at least one pending flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrelationState {
    pub pending_pet: bool,
    pub pending_can: bool,
    pub last_detection_at: Option<DateTime<Utc>>,
    pub last_weight: f64,
}

impl CorrelationState {
    pub fn has_pending(&self) -> bool {
        self.pending_pet || self.pending_can
    }

    /// Pending categories in confirmation order (PET first)
    pub fn pending_categories(&self) -> Vec<WasteCategory> {
        let mut categories = Vec::with_capacity(2);
        if self.pending_pet {
            categories.push(WasteCategory::Pet);
        }
        if self.pending_can {
            categories.push(WasteCategory::Can);
        }
        categories
    }

    pub(crate) fn set_pending(&mut self, category: WasteCategory) {
        match category {
            WasteCategory::Pet => self.pending_pet = true,
            WasteCategory::Can => self.pending_can = true,
        }
    }

    pub(crate) fn clear_pending(&mut self, category: WasteCategory) {
        match category {
            WasteCategory::Pet => self.pending_pet = false,
            WasteCategory::Can => self.pending_can = false,
        }
        if !self.has_pending() {
            self.last_detection_at = None;
        }
    }

    pub(crate) fn clear_all_pending(&mut self) {
        self.pending_pet = false;
        self.pending_can = false;
        self.last_detection_at = None;
    }

    /// True when the pending detection is older than `window` at `now`.
    ///
    /// A sample stamped before the detection counts as zero elapsed time.
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.last_detection_at {
            Some(detected_at) => elapsed_between(detected_at, now) > window,
            None => false,
        }
    }

    pub(crate) fn holds_invariant(&self) -> bool {
        self.last_detection_at.is_some() == self.has_pending()
    }
}

pub(crate) fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}
