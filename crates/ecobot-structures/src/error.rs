// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while building structures from producer input.

/// Result type alias for structure construction
pub type StructureResult<T> = Result<T, StructureError>;

/// Malformed producer input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    /// Vision class id that maps to no category
    #[error("Unknown detection class id: {0}")]
    UnknownClass(i64),

    /// Confidence outside 0.0..=1.0 or not a number
    #[error("Invalid detection confidence: {0}")]
    InvalidConfidence(f64),

    /// Weight that is NaN or infinite
    #[error("Non-finite weight reading: {0}")]
    NonFiniteWeight(f64),

    /// Empty raw sample batch from the load cell
    #[error("Load cell returned no raw samples")]
    EmptyRawBatch,

    /// Calibration that cannot convert raw readings
    #[error("Invalid load cell calibration: {0}")]
    InvalidCalibration(String),

    /// Coordinates outside the valid WGS84 range
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}
