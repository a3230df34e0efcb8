// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed readings emitted by the producers (vision, load cell, GPS).
//!
//! Constructors validate producer input so that malformed readings are
//! rejected at the ingest boundary and never reach the correlator.

use crate::error::{StructureError, StructureResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Class reported by the vision classifier for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedClass {
    /// PET bottle
    Pet,
    /// Aluminium can
    Can,
    /// Classifier could not separate the objects
    Mixed,
}

impl DetectedClass {
    /// Map a classifier class id. `0` is PET, every other non-negative id is a can.
    pub fn from_class_id(class_id: i64) -> StructureResult<Self> {
        match class_id {
            0 => Ok(DetectedClass::Pet),
            id if id > 0 => Ok(DetectedClass::Can),
            id => Err(StructureError::UnknownClass(id)),
        }
    }
}

/// One object found in a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "cls")]
    pub class: DetectedClass,
    #[serde(rename = "conf")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: DetectedClass, confidence: f32) -> StructureResult<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(StructureError::InvalidConfidence(confidence as f64));
        }
        Ok(Self { class, confidence })
    }

    /// Build from the raw classifier output (`cls`, `conf`)
    pub fn from_raw(class_id: i64, confidence: f64) -> StructureResult<Self> {
        let class = DetectedClass::from_class_id(class_id)?;
        if !confidence.is_finite() {
            return Err(StructureError::InvalidConfidence(confidence));
        }
        Self::new(class, confidence as f32)
    }
}

/// All detections produced by a single inference pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub detections: Vec<Detection>,
    pub observed_at: DateTime<Utc>,
}

impl DetectionFrame {
    pub fn new(detections: Vec<Detection>, observed_at: DateTime<Utc>) -> Self {
        Self {
            detections,
            observed_at,
        }
    }

    /// Frame with a single detection
    pub fn single(class: DetectedClass, confidence: f32, observed_at: DateTime<Utc>) -> StructureResult<Self> {
        Ok(Self::new(vec![Detection::new(class, confidence)?], observed_at))
    }

    pub fn object_count(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// More than two simultaneous objects: the classifier output is not trusted
    /// per object and the frame counts as one of each category.
    pub fn is_ambiguous(&self) -> bool {
        self.detections.len() > 2
    }

    /// Class of the first detection in the frame
    pub fn primary_class(&self) -> Option<DetectedClass> {
        self.detections.first().map(|d| d.class)
    }
}

/// One calibrated load cell reading in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub weight_g: f64,
    pub observed_at: DateTime<Utc>,
}

impl WeightSample {
    pub fn new(weight_g: f64, observed_at: DateTime<Utc>) -> StructureResult<Self> {
        if !weight_g.is_finite() {
            return Err(StructureError::NonFiniteWeight(weight_g));
        }
        Ok(Self {
            weight_g,
            observed_at,
        })
    }

    /// Readings below zero are load cell drift and are not accounted
    pub fn is_accountable(&self) -> bool {
        self.weight_g >= 0.0
    }
}

/// HX711-style linear calibration: `grams = (mean(raw) - offset) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadCellCalibration {
    pub offset: f64,
    pub scale: f64,
}

impl Default for LoadCellCalibration {
    fn default() -> Self {
        Self {
            offset: 14664.59,
            scale: 0.0388,
        }
    }
}

impl LoadCellCalibration {
    pub fn new(offset: f64, scale: f64) -> StructureResult<Self> {
        let calibration = Self { offset, scale };
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn validate(&self) -> StructureResult<()> {
        if !self.offset.is_finite() {
            return Err(StructureError::InvalidCalibration(format!(
                "offset must be finite, got {}",
                self.offset
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(StructureError::InvalidCalibration(format!(
                "scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Average a batch of raw readings and convert it to grams
    pub fn grams_from_raw(&self, raw: &[f64]) -> StructureResult<f64> {
        if raw.is_empty() {
            return Err(StructureError::EmptyRawBatch);
        }
        let mean = raw.iter().sum::<f64>() / raw.len() as f64;
        let grams = (mean - self.offset) / self.scale;
        if !grams.is_finite() {
            return Err(StructureError::NonFiniteWeight(grams));
        }
        Ok(grams)
    }
}

/// GPS fix reported while the collector moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "alt")]
    pub altitude_m: f64,
    #[serde(rename = "spd")]
    pub speed_kmh: f64,
    pub observed_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
        speed_kmh: f64,
        observed_at: DateTime<Utc>,
    ) -> StructureResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(StructureError::InvalidPosition(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(StructureError::InvalidPosition(format!(
                "longitude {} out of range",
                longitude
            )));
        }
        if !altitude_m.is_finite() || !speed_kmh.is_finite() {
            return Err(StructureError::InvalidPosition(
                "altitude and speed must be finite".to_string(),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude_m,
            speed_kmh,
            observed_at,
        })
    }
}
