// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Disposal events confirmed by the correlator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Waste categories accounted by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Pet,
    Can,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 2] = [WasteCategory::Pet, WasteCategory::Can];

    /// Waste id used by the ledger service
    pub fn ledger_waste_id(&self) -> i64 {
        match self {
            WasteCategory::Pet => 1,
            WasteCategory::Can => 2,
        }
    }

    pub fn from_ledger_waste_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(WasteCategory::Pet),
            2 => Some(WasteCategory::Can),
            _ => None,
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasteCategory::Pet => write!(f, "PET"),
            WasteCategory::Can => write!(f, "CAN"),
        }
    }
}

/// One collected item attributed to a category. Causes exactly one counter increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalEvent {
    pub category: WasteCategory,
    pub confirmed_at: DateTime<Utc>,
}

impl DisposalEvent {
    pub fn new(category: WasteCategory, confirmed_at: DateTime<Utc>) -> Self {
        Self {
            category,
            confirmed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_waste_ids() {
        for category in WasteCategory::ALL {
            assert_eq!(
                WasteCategory::from_ledger_waste_id(category.ledger_waste_id()),
                Some(category)
            );
        }
        assert_eq!(WasteCategory::from_ledger_waste_id(9), None);
    }
}
