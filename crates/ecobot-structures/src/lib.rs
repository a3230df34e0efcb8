// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-structures
//!
//! Core data structures shared by every ecobot crate.
//!
//! ## Overview
//! - **Samples**: what the producers emit (detection frames, weight and position readings)
//! - **Events**: what the correlator confirms (disposal events per waste category)
//! - **Periods**: what the remote ledger owns (work periods, waste collection counters)
//!
//! Samples are ephemeral and never persisted locally. Periods are held only as
//! immutable snapshots; the ledger is the source of truth.

pub mod error;
pub mod events;
pub mod periods;
pub mod samples;

pub use error::{StructureError, StructureResult};
pub use events::{DisposalEvent, WasteCategory};
pub use periods::{
    day_label, AccumulatedTotals, CounterId, LastPeriodStatus, PeriodId, WasteCollectionCounter,
    WorkPeriod,
};
pub use samples::{
    DetectedClass, Detection, DetectionFrame, LoadCellCalibration, PositionSample, WeightSample,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
