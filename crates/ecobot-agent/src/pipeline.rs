// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collection pipeline
//!
//! Feeds samples into the correlator and fans the results out to the ledger
//! and the bus. Correlation runs inline under the correlator's lock; every
//! side effect is dispatched afterwards as a detached task, so a slow or
//! unreachable ledger never holds up the next sample.

use std::sync::Arc;
use std::time::Duration;

use ecobot_config::TopicsConfig;
use ecobot_correlator::EventCorrelator;
use ecobot_ledger::RemoteLedger;
use ecobot_services::PeriodLifecycleManager;
use ecobot_structures::{DetectionFrame, DisposalEvent, PositionSample, WeightSample};
use ecobot_transports::ResilientPublisher;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What one sample produced: confirmed events plus the side effects still in flight
#[derive(Debug, Default)]
pub struct Dispatch {
    pub events: Vec<DisposalEvent>,
    pub tasks: Vec<JoinHandle<()>>,
}

impl Dispatch {
    /// Wait for every side effect of this sample
    pub async fn settle(self) -> Vec<DisposalEvent> {
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("[INGEST] Side effect task failed: {}", e);
            }
        }
        self.events
    }
}

pub struct CollectionPipeline {
    correlator: EventCorrelator,
    periods: Arc<PeriodLifecycleManager>,
    ledger: Arc<dyn RemoteLedger>,
    publisher: Arc<ResilientPublisher>,
    topics: TopicsConfig,
    ledger_timeout: Duration,
}

impl CollectionPipeline {
    pub fn new(
        correlator: EventCorrelator,
        periods: Arc<PeriodLifecycleManager>,
        ledger: Arc<dyn RemoteLedger>,
        publisher: Arc<ResilientPublisher>,
        topics: TopicsConfig,
        ledger_timeout: Duration,
    ) -> Self {
        Self {
            correlator,
            periods,
            ledger,
            publisher,
            topics,
            ledger_timeout,
        }
    }

    pub fn correlator(&self) -> &EventCorrelator {
        &self.correlator
    }

    pub fn periods(&self) -> &Arc<PeriodLifecycleManager> {
        &self.periods
    }

    pub fn publisher(&self) -> &Arc<ResilientPublisher> {
        &self.publisher
    }

    /// Update pending detections and publish the frame
    pub fn handle_detection(&self, frame: DetectionFrame) -> Dispatch {
        self.correlator.on_detection(&frame);

        Dispatch {
            events: Vec::new(),
            tasks: vec![self.spawn_publish(frame, &self.topics.vision)],
        }
    }

    /// Publish the reading; non-negative readings are also registered and correlated
    pub fn handle_weight(&self, sample: WeightSample) -> Dispatch {
        let mut tasks = vec![self.spawn_publish(sample, &self.topics.weight)];

        if !sample.is_accountable() {
            debug!("[INGEST] Negative reading {:.2} g published only", sample.weight_g);
            return Dispatch {
                events: Vec::new(),
                tasks,
            };
        }

        let events = self.correlator.on_weight(&sample);

        if let Some(task) = self.spawn_weight_registration(sample) {
            tasks.push(task);
        }
        for event in &events {
            info!("[INGEST] Disposal confirmed: {} at {}", event.category, event.confirmed_at);
            tasks.push(self.spawn_disposal(*event));
        }

        Dispatch { events, tasks }
    }

    /// Publish the fix and register it against the current period
    pub fn handle_position(&self, sample: PositionSample) -> Dispatch {
        let mut tasks = vec![self.spawn_publish(sample, &self.topics.position)];

        match self.periods.current_period_id() {
            Some(period_id) => {
                let ledger = Arc::clone(&self.ledger);
                let limit = self.ledger_timeout;
                tasks.push(tokio::spawn(async move {
                    let result =
                        tokio::time::timeout(limit, ledger.register_position_reading(period_id, &sample)).await;
                    log_ledger_result("position reading", result);
                }));
            }
            None => debug!("[INGEST] No open period, position not registered"),
        }

        Dispatch {
            events: Vec::new(),
            tasks,
        }
    }

    fn spawn_publish<T>(&self, payload: T, topic: &str) -> JoinHandle<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let publisher = Arc::clone(&self.publisher);
        let topic = topic.to_string();
        tokio::spawn(async move {
            publisher.publish(&payload, &topic).await;
        })
    }

    fn spawn_weight_registration(&self, sample: WeightSample) -> Option<JoinHandle<()>> {
        let Some(period_id) = self.periods.current_period_id() else {
            debug!("[INGEST] No open period, weight not registered");
            return None;
        };
        let ledger = Arc::clone(&self.ledger);
        let limit = self.ledger_timeout;
        Some(tokio::spawn(async move {
            let result =
                tokio::time::timeout(limit, ledger.register_weight_reading(period_id, &sample)).await;
            log_ledger_result("weight reading", result);
        }))
    }

    fn spawn_disposal(&self, event: DisposalEvent) -> JoinHandle<()> {
        let periods = Arc::clone(&self.periods);
        let limit = self.ledger_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(limit, periods.record_disposal(&event)).await {
                Ok(Ok(counter)) => debug!(
                    "[INGEST] {} counter {} now at {}",
                    counter.category, counter.collection_record_id, counter.count
                ),
                Ok(Err(e)) => warn!("[INGEST] Could not count {} disposal: {}", event.category, e),
                Err(_) => warn!(
                    "[INGEST] Counting {} disposal timed out after {:?}",
                    event.category, limit
                ),
            }
        })
    }
}

fn log_ledger_result<E: std::fmt::Display>(
    what: &str,
    result: Result<Result<(), E>, tokio::time::error::Elapsed>,
) {
    match result {
        Ok(Ok(())) => debug!("[INGEST] {} registered", what),
        Ok(Err(e)) => warn!("[INGEST] Failed to register {}: {}", what, e),
        Err(_) => warn!("[INGEST] Registering {} timed out", what),
    }
}
