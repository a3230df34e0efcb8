// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulated producers for bench runs without hardware
//!
//! A container fills with random PET bottles (20-60 g) and cans (12-25 g),
//! each announced by a detection frame before its weight lands, until it holds
//! about a kilogram; then it is emptied in 150-250 g steps. Weight goes out as
//! raw load cell batches so the calibration path runs as it would on the device.

use std::time::Duration;

use chrono::Utc;
use ecobot_structures::{
    DetectedClass, Detection, DetectionFrame, LoadCellCalibration, PositionSample,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ingest::{IngestSenders, RawWeightBatch};

const CONTAINER_CAPACITY_G: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub tick: Duration,
    pub calibration: LoadCellCalibration,
    pub samples_per_reading: usize,
    /// Base position of the GPS random walk (lat, lon)
    pub origin: (f64, f64),
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            calibration: LoadCellCalibration::default(),
            samples_per_reading: 20,
            origin: (4.6097, -74.0817),
            seed: None,
        }
    }
}

/// One simulated tick
#[derive(Debug, Clone, PartialEq)]
pub struct SimStep {
    /// Class id and confidence of the item dropped in, if any
    pub detection: Option<(i64, f64)>,
    pub weight_g: f64,
}

/// Fill/empty model of the collection container
#[derive(Debug)]
pub struct SimulatedContainer {
    weight_g: f64,
    filling: bool,
    rng: StdRng,
}

impl SimulatedContainer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            weight_g: 0.0,
            filling: true,
            rng,
        }
    }

    pub fn weight_g(&self) -> f64 {
        self.weight_g
    }

    pub fn is_filling(&self) -> bool {
        self.filling
    }

    pub fn step(&mut self) -> SimStep {
        if self.filling {
            let (class_id, added) = if self.rng.gen_bool(0.5) {
                (0, self.rng.gen_range(20.0..60.0))
            } else {
                (1, self.rng.gen_range(12.0..25.0))
            };
            let confidence = self.rng.gen_range(0.55..0.99);
            self.weight_g += added;
            if self.weight_g >= CONTAINER_CAPACITY_G {
                info!("[INGEST] Simulated container full ({:.0} g), emptying", self.weight_g);
                self.filling = false;
            }
            SimStep {
                detection: Some((class_id, confidence)),
                weight_g: self.weight_g,
            }
        } else {
            self.weight_g -= self.rng.gen_range(150.0..250.0);
            if self.weight_g <= 0.0 {
                self.weight_g = 0.0;
                self.filling = true;
                info!("[INGEST] Simulated container empty, filling again");
            }
            SimStep {
                detection: None,
                weight_g: self.weight_g,
            }
        }
    }

    /// Raw HX711-like counts that calibrate back to `grams`, with a little noise
    pub fn raw_batch(&mut self, calibration: &LoadCellCalibration, grams: f64, samples: usize) -> Vec<f64> {
        let center = grams * calibration.scale + calibration.offset;
        (0..samples.max(1))
            .map(|_| center + self.rng.gen_range(-0.01..0.01))
            .collect()
    }
}

/// Start the detection/weight and position producers; they stop when `shutdown` flips to true
pub fn spawn_simulation(
    senders: IngestSenders,
    config: SimulationConfig,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    info!("[INGEST] Simulated producers enabled (tick {:?})", config.tick);

    let container_task = {
        let senders = senders.clone();
        let mut shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut container = SimulatedContainer::new(config.seed);
            let mut ticker = tokio::time::interval(config.tick);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }
                if *shutdown.borrow() {
                    break;
                }

                let step = container.step();
                if let Some((class_id, confidence)) = step.detection {
                    match Detection::from_raw(class_id, confidence) {
                        Ok(detection) => {
                            let frame = DetectionFrame::new(vec![detection], Utc::now());
                            if senders.detections.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("[INGEST] Simulated detection rejected: {}", e),
                    }
                    // Item lands a moment after it is seen
                    tokio::time::sleep(config.tick / 4).await;
                }

                let raw = container.raw_batch(&config.calibration, step.weight_g, config.samples_per_reading);
                let batch = RawWeightBatch {
                    raw,
                    observed_at: Utc::now(),
                };
                if senders.raw_weights.send(batch).await.is_err() {
                    break;
                }
            }
            debug!("[INGEST] Simulated container stopped");
        })
    };

    let position_task = {
        let mut shutdown = shutdown;
        tokio::spawn(async move {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
                None => StdRng::from_entropy(),
            };
            let (mut lat, mut lon) = config.origin;
            let mut ticker = tokio::time::interval(config.tick * 5);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }
                if *shutdown.borrow() {
                    break;
                }

                lat = (lat + rng.gen_range(-0.00005..0.00005)).clamp(-90.0, 90.0);
                lon = (lon + rng.gen_range(-0.00005..0.00005)).clamp(-180.0, 180.0);
                let speed = rng.gen_range(0.0..4.0);
                match PositionSample::new(lat, lon, 2640.0, speed, Utc::now()) {
                    Ok(sample) => {
                        if senders.positions.send(sample).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("[INGEST] Simulated fix rejected: {}", e),
                }
            }
            debug!("[INGEST] Simulated GPS stopped");
        })
    };

    vec![container_task, position_task]
}
