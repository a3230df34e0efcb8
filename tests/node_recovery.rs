// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Whole-node behavior across a crash: collect, die with the period open,
//! restart, and check that the old period is closed exactly once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ecobot::prelude::*;
use ecobot::ledger::{LedgerCall, LedgerOp};
use ecobot::config::TopicsConfig;

fn node(ledger: &Arc<InMemoryLedger>) -> Arc<PeriodLifecycleManager> {
    Arc::new(PeriodLifecycleManager::new(ledger.clone(), RetryPolicy::none()))
}

fn pipeline(ledger: &Arc<InMemoryLedger>, periods: &Arc<PeriodLifecycleManager>) -> CollectionPipeline {
    CollectionPipeline::new(
        EventCorrelator::new(CorrelatorConfig::default()),
        periods.clone(),
        ledger.clone(),
        Arc::new(ResilientPublisher::disabled("bot-1", "sensors/data", "test")),
        TopicsConfig::default(),
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn test_restart_closes_period_left_open() {
    let ledger = Arc::new(InMemoryLedger::new());

    // First run: collect one can, then "crash" without closing
    let first_run = node(&ledger);
    let first_period = first_run.initialize().await.unwrap();
    first_run.open_waste_counters().await.unwrap();
    let p = pipeline(&ledger, &first_run);
    let now = Utc::now();
    p.handle_detection(DetectionFrame::single(DetectedClass::Can, 0.9, now).unwrap())
        .settle()
        .await;
    let events = p.handle_weight(WeightSample::new(16.0, now).unwrap()).settle().await;
    assert_eq!(events.len(), 1);
    drop(p);
    drop(first_run);
    assert!(!ledger.is_closed(first_period));

    // Second run resumes: the abandoned period gets closed, a new one opens
    let second_run = node(&ledger);
    let second_period = second_run.initialize().await.unwrap();

    assert_ne!(first_period, second_period);
    assert!(ledger.is_closed(first_period));
    let closes = ledger.calls_of(LedgerOp::ClosePeriod);
    assert_eq!(closes.len(), 1);
    assert!(matches!(
        &closes[0],
        LedgerCall::ClosePeriod { period_id, .. } if *period_id == first_period
    ));
    assert_eq!(second_run.phase(), PeriodPhase::Open);
}

#[tokio::test]
async fn test_clean_restart_does_not_close_anything() {
    let ledger = Arc::new(InMemoryLedger::new());
    let earlier = ledger.create_period(Utc::now()).await.unwrap();
    ledger.close_period(earlier, "2025-01-01T00:00:00Z").await.unwrap();

    let periods = node(&ledger);
    periods.initialize().await.unwrap();

    assert_eq!(ledger.calls_of(LedgerOp::ClosePeriod).len(), 1);
    assert_eq!(ledger.period_count(), 2);
}
