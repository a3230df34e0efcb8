// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ecobot-agent
//!
//! The collection node: producers push samples into bounded channels, ingest
//! tasks hand them to the [`CollectionPipeline`], and the pipeline fuses them
//! into disposal events and dispatches ledger writes and bus messages.
//!
//! ```text
//! detections ─┐
//! load cell  ─┼─► ingest tasks ─► CollectionPipeline ─► EventCorrelator
//! gps        ─┘                          │
//!                                        ├─► PeriodLifecycleManager (counters)
//!                                        ├─► RemoteLedger (readings)
//!                                        └─► ResilientPublisher (telemetry)
//! ```

pub mod ingest;
pub mod pipeline;
pub mod recharge;
pub mod simulate;

pub use ingest::{calibrate, spawn_ingest, IngestSenders, IngestTasks, RawWeightBatch};
pub use pipeline::{CollectionPipeline, Dispatch};
pub use recharge::{spawn_line_reader, spawn_recharge_listener, OperatorCommand};
pub use simulate::{spawn_simulation, SimStep, SimulatedContainer, SimulationConfig};
