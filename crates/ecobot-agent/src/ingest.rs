// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ingest tasks
//!
//! One task per producer stream, each draining its own channel into the
//! pipeline. Producers only ever hold the senders; dropping every sender ends
//! the matching task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ecobot_structures::{DetectionFrame, LoadCellCalibration, PositionSample, WeightSample};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::pipeline::CollectionPipeline;

/// Unconverted load cell batch, averaged and calibrated on ingest
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeightBatch {
    pub raw: Vec<f64>,
    pub observed_at: DateTime<Utc>,
}

/// Channel ends handed to producers
#[derive(Debug, Clone)]
pub struct IngestSenders {
    pub detections: mpsc::Sender<DetectionFrame>,
    pub weights: mpsc::Sender<WeightSample>,
    pub raw_weights: mpsc::Sender<RawWeightBatch>,
    pub positions: mpsc::Sender<PositionSample>,
}

/// Running ingest tasks
pub struct IngestTasks {
    handles: Vec<JoinHandle<()>>,
}

impl IngestTasks {
    /// Wait for every task; they end once all senders are dropped
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("[INGEST] Ingest task ended abnormally: {}", e);
            }
        }
    }

    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Start the four ingest loops over bounded channels of `capacity`
pub fn spawn_ingest(
    pipeline: Arc<CollectionPipeline>,
    calibration: LoadCellCalibration,
    capacity: usize,
) -> (IngestSenders, IngestTasks) {
    let (detections, mut detection_rx) = mpsc::channel::<DetectionFrame>(capacity);
    let (weights, mut weight_rx) = mpsc::channel::<WeightSample>(capacity);
    let (raw_weights, mut raw_rx) = mpsc::channel::<RawWeightBatch>(capacity);
    let (positions, mut position_rx) = mpsc::channel::<PositionSample>(capacity);

    let mut handles = Vec::with_capacity(4);

    let p = Arc::clone(&pipeline);
    handles.push(tokio::spawn(async move {
        debug!("[INGEST] Detection stream started");
        while let Some(frame) = detection_rx.recv().await {
            p.handle_detection(frame);
        }
        info!("[INGEST] Detection stream closed");
    }));

    let p = Arc::clone(&pipeline);
    handles.push(tokio::spawn(async move {
        debug!("[INGEST] Weight stream started");
        while let Some(sample) = weight_rx.recv().await {
            if !sample.weight_g.is_finite() {
                warn!("[INGEST] Dropping non-finite weight {}", sample.weight_g);
                continue;
            }
            p.handle_weight(sample);
        }
        info!("[INGEST] Weight stream closed");
    }));

    let p = Arc::clone(&pipeline);
    handles.push(tokio::spawn(async move {
        debug!("[INGEST] Load cell stream started");
        while let Some(batch) = raw_rx.recv().await {
            match calibrate(&calibration, &batch) {
                Ok(sample) => {
                    p.handle_weight(sample);
                }
                Err(reason) => warn!("[INGEST] Dropping load cell batch: {}", reason),
            }
        }
        info!("[INGEST] Load cell stream closed");
    }));

    let p = pipeline;
    handles.push(tokio::spawn(async move {
        debug!("[INGEST] Position stream started");
        while let Some(sample) = position_rx.recv().await {
            p.handle_position(sample);
        }
        info!("[INGEST] Position stream closed");
    }));

    (
        IngestSenders {
            detections,
            weights,
            raw_weights,
            positions,
        },
        IngestTasks { handles },
    )
}

/// Average and convert a raw batch to a weight sample
pub fn calibrate(
    calibration: &LoadCellCalibration,
    batch: &RawWeightBatch,
) -> Result<WeightSample, ecobot_structures::StructureError> {
    let grams = calibration.grams_from_raw(&batch.raw)?;
    WeightSample::new(grams, batch.observed_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobot_structures::StructureError;

    #[test]
    fn test_calibrate_batch() {
        let calibration = LoadCellCalibration::new(100.0, 2.0).unwrap();
        let batch = RawWeightBatch {
            raw: vec![118.0, 122.0],
            observed_at: Utc::now(),
        };
        let sample = calibrate(&calibration, &batch).unwrap();
        assert_eq!(sample.weight_g, 10.0);
        assert_eq!(sample.observed_at, batch.observed_at);
    }

    #[test]
    fn test_calibrate_empty_batch() {
        let batch = RawWeightBatch {
            raw: Vec::new(),
            observed_at: Utc::now(),
        };
        assert_eq!(
            calibrate(&LoadCellCalibration::default(), &batch),
            Err(StructureError::EmptyRawBatch)
        );
    }
}
