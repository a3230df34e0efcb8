// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Work-period lifecycle manager.

Decides on startup whether a period left open by a crash must be closed before
a new one is opened, owns the current period id that downstream writes are
tagged with, and handles operator-triggered close/reopen.

Readers (`current_period_id`, `current_period`, `counters`) never block: the
period and its counters are immutable snapshots swapped atomically. Transitions
(`initialize`, `open_waste_counters`, `close_period_and_reopen`) are serialized
by an async mutex.
*/

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, SecondsFormat, Utc};
use ecobot_ledger::{retry_with_backoff, RemoteLedger, RetryPolicy};
use ecobot_structures::{
    AccumulatedTotals, DisposalEvent, PeriodId, WasteCategory, WasteCollectionCounter, WorkPeriod,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::types::{PeriodError, PeriodPhase, PeriodResult, WasteCounters};

/// End marker written when closing a period
fn end_marker(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Ledger steps of a close/reopen that already succeeded
///
/// Kept after a failure so the next attempt resumes instead of closing the
/// previous period twice or leaving a created period behind.
#[derive(Debug, Clone)]
struct PartialReopen {
    previous: PeriodId,
    end_marker: String,
    totals: Option<AccumulatedTotals>,
    closed: bool,
    reading_updated: bool,
    period: Option<WorkPeriod>,
    baseline_written: bool,
}

impl PartialReopen {
    fn new(previous: PeriodId, now: DateTime<Utc>) -> Self {
        Self {
            previous,
            end_marker: end_marker(now),
            totals: None,
            closed: false,
            reading_updated: false,
            period: None,
            baseline_written: false,
        }
    }
}

pub struct PeriodLifecycleManager {
    ledger: Arc<dyn RemoteLedger>,
    retry: RetryPolicy,
    phase: RwLock<PeriodPhase>,
    period: ArcSwapOption<WorkPeriod>,
    counters: ArcSwapOption<WasteCounters>,
    partial_reopen: Mutex<Option<PartialReopen>>,
    transition: tokio::sync::Mutex<()>,
}

impl PeriodLifecycleManager {
    pub fn new(ledger: Arc<dyn RemoteLedger>, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            retry,
            phase: RwLock::new(PeriodPhase::Uninitialized),
            period: ArcSwapOption::empty(),
            counters: ArcSwapOption::empty(),
            partial_reopen: Mutex::new(None),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    pub fn phase(&self) -> PeriodPhase {
        *self.phase.read()
    }

    fn set_phase(&self, phase: PeriodPhase) {
        let mut current = self.phase.write();
        if *current != phase {
            debug!("[PERIODS] {} -> {}", *current, phase);
            *current = phase;
        }
    }

    /// Id that downstream writes are tagged with, `None` before `initialize`
    pub fn current_period_id(&self) -> Option<PeriodId> {
        (*self.period.load()).as_ref().map(|period| period.period_id)
    }

    pub fn current_period(&self) -> Option<Arc<WorkPeriod>> {
        self.period.load_full()
    }

    pub fn counters(&self) -> Option<Arc<WasteCounters>> {
        self.counters.load_full()
    }

    /// Resume-or-create on startup
    ///
    /// A prior period still carrying its open-ended marker is closed first
    /// (totals, close, reading update), then a fresh period is opened with a
    /// baseline reading. Any ledger failure aborts and leaves the manager
    /// `Uninitialized`.
    pub async fn initialize(&self) -> PeriodResult<PeriodId> {
        let _guard = self.transition.lock().await;

        let phase = self.phase();
        if phase != PeriodPhase::Uninitialized {
            return Err(PeriodError::AlreadyInitialized(phase));
        }

        let result = self.resume_or_create(Utc::now()).await;
        match result {
            Ok(period) => {
                let period_id = period.period_id;
                info!(
                    "[PERIODS] Period {} open (started {}, {})",
                    period_id, period.started_at, period.day_label
                );
                self.period.store(Some(Arc::new(period)));
                self.set_phase(PeriodPhase::Open);
                Ok(period_id)
            }
            Err(e) => {
                error!("[PERIODS] Startup failed: {}", e);
                self.set_phase(PeriodPhase::Uninitialized);
                Err(e)
            }
        }
    }

    async fn resume_or_create(&self, now: DateTime<Utc>) -> PeriodResult<WorkPeriod> {
        let ledger = &self.ledger;
        let status = retry_with_backoff(&self.retry, "last period status", move || {
            ledger.last_period_status()
        })
        .await
        .map_err(PeriodError::ledger("last period status"))?;

        match status.left_open() {
            Some((prior_id, marker)) => {
                warn!(
                    "[PERIODS] Period {} was left open (last activity {}), closing it",
                    prior_id, marker
                );
                self.set_phase(PeriodPhase::Closing);
                let totals = self.close_with_totals(prior_id, marker).await?;
                info!(
                    "[PERIODS] Recovered period {} closed: {:.1} m, {:.4} kg",
                    prior_id, totals.distance_traveled, totals.weight_waste
                );
            }
            None if status.exists() => {
                debug!("[PERIODS] Last period was closed cleanly");
            }
            None => info!("[PERIODS] No prior period for this device"),
        }

        self.open_period(now).await
    }

    /// Fetch totals, close the period at `marker`, write the final reading
    async fn close_with_totals(
        &self,
        period_id: PeriodId,
        marker: &str,
    ) -> PeriodResult<AccumulatedTotals> {
        let totals = self.fetch_totals(period_id).await?;
        self.close(period_id, marker).await?;
        self.write_final_reading(period_id, totals).await?;
        Ok(totals)
    }

    async fn fetch_totals(&self, period_id: PeriodId) -> PeriodResult<AccumulatedTotals> {
        let ledger = &self.ledger;
        retry_with_backoff(&self.retry, "accumulated totals", move || {
            ledger.accumulated_totals(period_id)
        })
        .await
        .map_err(PeriodError::ledger("accumulated totals"))
    }

    async fn close(&self, period_id: PeriodId, marker: &str) -> PeriodResult<()> {
        let ledger = &self.ledger;
        retry_with_backoff(&self.retry, "close period", move || {
            ledger.close_period(period_id, marker)
        })
        .await
        .map_err(PeriodError::ledger("close period"))
    }

    async fn write_final_reading(
        &self,
        period_id: PeriodId,
        totals: AccumulatedTotals,
    ) -> PeriodResult<()> {
        let ledger = &self.ledger;
        retry_with_backoff(&self.retry, "update reading", move || {
            ledger.update_reading(period_id, totals)
        })
        .await
        .map_err(PeriodError::ledger("update reading"))
    }

    /// New period plus its zeroed baseline reading
    async fn open_period(&self, now: DateTime<Utc>) -> PeriodResult<WorkPeriod> {
        let period = self.create_period(now).await?;
        self.write_baseline(period.period_id).await?;
        Ok(period)
    }

    async fn create_period(&self, now: DateTime<Utc>) -> PeriodResult<WorkPeriod> {
        let ledger = &self.ledger;
        let period_id = retry_with_backoff(&self.retry, "create period", move || {
            ledger.create_period(now)
        })
        .await
        .map_err(PeriodError::ledger("create period"))?;
        Ok(WorkPeriod::opened(period_id, now))
    }

    async fn write_baseline(&self, period_id: PeriodId) -> PeriodResult<()> {
        let ledger = &self.ledger;
        retry_with_backoff(&self.retry, "baseline reading", move || {
            ledger.create_baseline_reading(period_id)
        })
        .await
        .map_err(PeriodError::ledger("baseline reading"))
    }

    async fn create_counters(&self, period_id: PeriodId) -> PeriodResult<WasteCounters> {
        let ledger = &self.ledger;
        let mut created = Vec::with_capacity(WasteCategory::ALL.len());

        for category in WasteCategory::ALL {
            let counter_id = retry_with_backoff(&self.retry, "create waste counter", move || {
                ledger.create_waste_counter(period_id, category)
            })
            .await
            .map_err(PeriodError::ledger("create waste counter"))?;

            debug!(
                "[PERIODS] {} counter {} created for period {}",
                category, counter_id, period_id
            );
            created.push(WasteCollectionCounter::new(category, counter_id));
        }

        Ok(WasteCounters {
            pet: created[0],
            can: created[1],
        })
    }

    /// Create the Pet and Can counters for the current period
    ///
    /// Returns the existing counters if they were already opened.
    pub async fn open_waste_counters(&self) -> PeriodResult<Arc<WasteCounters>> {
        let _guard = self.transition.lock().await;

        let period = self.require_open("open waste counters")?;
        if let Some(existing) = self.counters.load_full() {
            return Ok(existing);
        }

        let counters = Arc::new(self.create_counters(period.period_id).await?);
        self.counters.store(Some(Arc::clone(&counters)));
        info!(
            "[PERIODS] Waste counters open for period {} (PET {}, CAN {})",
            period.period_id, counters.pet.collection_record_id, counters.can.collection_record_id
        );
        Ok(counters)
    }

    /// Close the current period (end marker = now) and open a fresh one with new counters
    ///
    /// On failure the manager stays `Open` with the previous period and counters.
    /// The steps that did succeed are remembered: the next call does not close
    /// the previous period again and adopts a period that was already created.
    pub async fn close_period_and_reopen(&self) -> PeriodResult<PeriodId> {
        self.close_period_and_reopen_at(Utc::now()).await
    }

    pub async fn close_period_and_reopen_at(&self, now: DateTime<Utc>) -> PeriodResult<PeriodId> {
        let _guard = self.transition.lock().await;

        let previous = self.require_open("close and reopen")?;
        self.set_phase(PeriodPhase::Closing);
        info!("[PERIODS] Closing period {}", previous.period_id);

        let result = self.reopen(previous.period_id, now).await;
        self.set_phase(PeriodPhase::Open);

        match result {
            Ok((period, counters)) => {
                let period_id = period.period_id;
                self.period.store(Some(Arc::new(period)));
                self.counters.store(Some(Arc::new(counters)));
                info!(
                    "[PERIODS] Period {} closed, period {} open",
                    previous.period_id, period_id
                );
                Ok(period_id)
            }
            Err(e) => {
                error!(
                    "[PERIODS] Reopen failed, keeping period {}: {}",
                    previous.period_id, e
                );
                Err(e)
            }
        }
    }

    async fn reopen(
        &self,
        previous: PeriodId,
        now: DateTime<Utc>,
    ) -> PeriodResult<(WorkPeriod, WasteCounters)> {
        let partial = self.partial_reopen.lock().take();
        let mut progress = match partial {
            Some(partial) if partial.previous == previous => {
                info!(
                    "[PERIODS] Resuming interrupted reopen of period {} (closed={}, new period={:?})",
                    previous,
                    partial.closed,
                    partial.period.as_ref().map(|period| period.period_id)
                );
                partial
            }
            _ => PartialReopen::new(previous, now),
        };

        let result = self.advance_reopen(&mut progress, now).await;
        if result.is_err() {
            *self.partial_reopen.lock() = Some(progress);
        }
        result
    }

    /// Run the close/reopen steps not yet recorded in `progress`
    async fn advance_reopen(
        &self,
        progress: &mut PartialReopen,
        now: DateTime<Utc>,
    ) -> PeriodResult<(WorkPeriod, WasteCounters)> {
        let previous = progress.previous;

        let totals = match progress.totals {
            Some(totals) => totals,
            None => {
                let totals = self.fetch_totals(previous).await?;
                progress.totals = Some(totals);
                totals
            }
        };
        if !progress.closed {
            self.close(previous, &progress.end_marker).await?;
            progress.closed = true;
        }
        if !progress.reading_updated {
            self.write_final_reading(previous, totals).await?;
            progress.reading_updated = true;
        }

        let period = match &progress.period {
            Some(period) => period.clone(),
            None => {
                let period = self.create_period(now).await?;
                progress.period = Some(period.clone());
                period
            }
        };
        if !progress.baseline_written {
            self.write_baseline(period.period_id).await?;
            progress.baseline_written = true;
        }

        let counters = self.create_counters(period.period_id).await?;
        Ok((period, counters))
    }

    /// Count one disposal against the live counter of its category
    ///
    /// Single attempt: a repeated increment after an ambiguous failure could
    /// count the item twice.
    pub async fn record_disposal(&self, event: &DisposalEvent) -> PeriodResult<WasteCollectionCounter> {
        let counters = self.counters.load_full().ok_or(PeriodError::CountersNotOpen)?;
        let counter = *counters.get(event.category);

        self.ledger
            .increment_waste_counter(counter.collection_record_id)
            .await
            .map_err(PeriodError::ledger("increment waste counter"))?;

        // Local tally only moves if the counter was not swapped meanwhile
        let record_id = counter.collection_record_id;
        self.counters.rcu(|current| {
            current.as_ref().map(|live| {
                if live.get(event.category).collection_record_id == record_id {
                    Arc::new(live.incremented(event.category))
                } else {
                    Arc::clone(live)
                }
            })
        });

        debug!(
            "[PERIODS] {} counter {} incremented ({} at {})",
            event.category, record_id, counter.count + 1, event.confirmed_at
        );
        Ok(counter.incremented())
    }

    fn require_open(&self, operation: &'static str) -> PeriodResult<Arc<WorkPeriod>> {
        let phase = self.phase();
        match (phase, self.period.load_full()) {
            (PeriodPhase::Open, Some(period)) => Ok(period),
            _ => Err(PeriodError::InvalidState { operation, phase }),
        }
    }
}
