// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Work periods and waste collection counters.
//!
//! The remote ledger owns the history. Locally these are value snapshots:
//! the current period is replaced as a whole, never edited in place.

use crate::events::WasteCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-assigned work period id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub i64);

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned waste collection record id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterId(pub i64);

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded accounting interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPeriod {
    pub period_id: PeriodId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Abbreviated weekday of `started_at` ("Mon", "Tue", ...)
    pub day_label: String,
}

impl WorkPeriod {
    /// Snapshot of a period that was just opened
    pub fn opened(period_id: PeriodId, started_at: DateTime<Utc>) -> Self {
        Self {
            period_id,
            started_at,
            ended_at: None,
            day_label: day_label(started_at),
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Weekday label stored with each period
pub fn day_label(at: DateTime<Utc>) -> String {
    at.format("%a").to_string()
}

/// Distance and weight the ledger accumulated for a period
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccumulatedTotals {
    pub distance_traveled: f64,
    pub weight_waste: f64,
}

/// Answer to "what was the most recent period?"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastPeriodStatus {
    /// `None` when the ledger has never opened a period for this device
    pub period_id: Option<PeriodId>,
    /// Last activity mark of a period that was never closed
    pub open_marker: Option<String>,
}

impl LastPeriodStatus {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn exists(&self) -> bool {
        self.period_id.is_some()
    }

    /// The period exists and still carries its open-ended marker (left open by a crash)
    pub fn left_open(&self) -> Option<(PeriodId, &str)> {
        match (self.period_id, self.open_marker.as_deref()) {
            (Some(id), Some(marker)) if !marker.is_empty() => Some((id, marker)),
            _ => None,
        }
    }
}

/// Live per-category counter of the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteCollectionCounter {
    pub category: WasteCategory,
    pub collection_record_id: CounterId,
    pub count: u64,
}

impl WasteCollectionCounter {
    pub fn new(category: WasteCategory, collection_record_id: CounterId) -> Self {
        Self {
            category,
            collection_record_id,
            count: 0,
        }
    }

    pub fn incremented(self) -> Self {
        Self {
            count: self.count + 1,
            ..self
        }
    }
}
