// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle types: phases, counter snapshots and errors

pub mod errors;

pub use errors::{PeriodError, PeriodResult};

use ecobot_structures::{WasteCategory, WasteCollectionCounter};
use std::fmt;

/// Where the manager is in the period state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodPhase {
    /// Nothing known about the ledger yet
    Uninitialized,
    /// A period is open and tags downstream writes
    Open,
    /// A period is being closed (crash recovery or reopen)
    Closing,
}

impl fmt::Display for PeriodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodPhase::Uninitialized => write!(f, "uninitialized"),
            PeriodPhase::Open => write!(f, "open"),
            PeriodPhase::Closing => write!(f, "closing"),
        }
    }
}

/// The live Pet and Can counters of the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasteCounters {
    pub pet: WasteCollectionCounter,
    pub can: WasteCollectionCounter,
}

impl WasteCounters {
    pub fn get(&self, category: WasteCategory) -> &WasteCollectionCounter {
        match category {
            WasteCategory::Pet => &self.pet,
            WasteCategory::Can => &self.can,
        }
    }

    /// Copy with one more item counted for `category`
    pub fn incremented(&self, category: WasteCategory) -> Self {
        let mut next = *self;
        match category {
            WasteCategory::Pet => next.pet = next.pet.incremented(),
            WasteCategory::Can => next.can = next.can.incremented(),
        }
        next
    }
}
