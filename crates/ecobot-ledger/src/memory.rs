// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process ledger
//!
//! Keeps periods, counters and readings in memory and records every call.
//! Used for offline bench runs of the node and as a test double; faults can be
//! queued per operation to exercise retry and recovery paths.

use crate::error::{LedgerError, LedgerResult};
use crate::traits::RemoteLedger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecobot_structures::{
    AccumulatedTotals, CounterId, LastPeriodStatus, PeriodId, PositionSample, WasteCategory,
    WeightSample,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Ledger operation kinds, used to queue faults and count attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    LastPeriodStatus,
    CreatePeriod,
    CreateBaselineReading,
    AccumulatedTotals,
    ClosePeriod,
    UpdateReading,
    CreateWasteCounter,
    IncrementWasteCounter,
    RegisterWeightReading,
    RegisterPositionReading,
    RequestBackup,
}

/// A call that completed successfully
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCall {
    LastPeriodStatus,
    CreatePeriod { period_id: PeriodId },
    CreateBaselineReading { period_id: PeriodId },
    AccumulatedTotals { period_id: PeriodId },
    ClosePeriod { period_id: PeriodId, end_marker: String },
    UpdateReading { period_id: PeriodId, totals: AccumulatedTotals },
    CreateWasteCounter { period_id: PeriodId, category: WasteCategory, counter_id: CounterId },
    IncrementWasteCounter { counter_id: CounterId },
    RegisterWeightReading { period_id: PeriodId, weight_g: f64 },
    RegisterPositionReading { period_id: PeriodId },
    RequestBackup,
}

impl LedgerCall {
    pub fn op(&self) -> LedgerOp {
        match self {
            LedgerCall::LastPeriodStatus => LedgerOp::LastPeriodStatus,
            LedgerCall::CreatePeriod { .. } => LedgerOp::CreatePeriod,
            LedgerCall::CreateBaselineReading { .. } => LedgerOp::CreateBaselineReading,
            LedgerCall::AccumulatedTotals { .. } => LedgerOp::AccumulatedTotals,
            LedgerCall::ClosePeriod { .. } => LedgerOp::ClosePeriod,
            LedgerCall::UpdateReading { .. } => LedgerOp::UpdateReading,
            LedgerCall::CreateWasteCounter { .. } => LedgerOp::CreateWasteCounter,
            LedgerCall::IncrementWasteCounter { .. } => LedgerOp::IncrementWasteCounter,
            LedgerCall::RegisterWeightReading { .. } => LedgerOp::RegisterWeightReading,
            LedgerCall::RegisterPositionReading { .. } => LedgerOp::RegisterPositionReading,
            LedgerCall::RequestBackup => LedgerOp::RequestBackup,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredPeriod {
    /// Last activity, reported back while the period is open
    last_marker: String,
    end_marker: Option<String>,
    totals: AccumulatedTotals,
    readings: usize,
}

#[derive(Debug, Clone, Copy)]
struct StoredCounter {
    category: WasteCategory,
    count: u64,
}

#[derive(Default)]
struct MemoryState {
    periods: BTreeMap<PeriodId, StoredPeriod>,
    counters: BTreeMap<CounterId, StoredCounter>,
    next_period_id: i64,
    next_counter_id: i64,
    calls: Vec<LedgerCall>,
    attempts: HashMap<LedgerOp, usize>,
    faults: HashMap<LedgerOp, VecDeque<LedgerError>>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<MemoryState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose last period `period_id` was never closed
    pub fn with_open_period(period_id: PeriodId, open_marker: &str, totals: AccumulatedTotals) -> Self {
        let ledger = Self::new();
        {
            let mut state = ledger.state.lock();
            state.periods.insert(
                period_id,
                StoredPeriod {
                    last_marker: open_marker.to_string(),
                    end_marker: None,
                    totals,
                    readings: 1,
                },
            );
            state.next_period_id = period_id.0;
        }
        ledger
    }

    /// Make the next call of `op` fail with `error`. Queued faults are consumed in order.
    pub fn fail_next(&self, op: LedgerOp, error: LedgerError) {
        self.state.lock().faults.entry(op).or_default().push_back(error);
    }

    /// Successful calls in order
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    /// Successful calls of one kind
    pub fn calls_of(&self, op: LedgerOp) -> Vec<LedgerCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    /// Attempts of `op`, failed ones included
    pub fn attempts(&self, op: LedgerOp) -> usize {
        self.state.lock().attempts.get(&op).copied().unwrap_or(0)
    }

    pub fn counter_value(&self, counter_id: CounterId) -> Option<u64> {
        self.state.lock().counters.get(&counter_id).map(|c| c.count)
    }

    /// Counter ids and categories, oldest first
    pub fn counters(&self) -> Vec<(CounterId, WasteCategory, u64)> {
        self.state
            .lock()
            .counters
            .iter()
            .map(|(id, c)| (*id, c.category, c.count))
            .collect()
    }

    pub fn is_closed(&self, period_id: PeriodId) -> bool {
        self.state
            .lock()
            .periods
            .get(&period_id)
            .map(|p| p.end_marker.is_some())
            .unwrap_or(false)
    }

    /// Reading rows created for a period
    pub fn reading_rows(&self, period_id: PeriodId) -> usize {
        self.state
            .lock()
            .periods
            .get(&period_id)
            .map(|p| p.readings)
            .unwrap_or(0)
    }

    pub fn period_count(&self) -> usize {
        self.state.lock().periods.len()
    }

    /// Count the attempt and pop a queued fault, if any
    fn begin(&self, state: &mut MemoryState, op: LedgerOp) -> LedgerResult<()> {
        *state.attempts.entry(op).or_default() += 1;
        match state.faults.get_mut(&op).and_then(|queue| queue.pop_front()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn period_exists(state: &MemoryState, period_id: PeriodId) -> LedgerResult<()> {
        if state.periods.contains_key(&period_id) {
            Ok(())
        } else {
            Err(LedgerError::Status {
                status: 404,
                body: format!("period {} not found", period_id),
            })
        }
    }
}

#[async_trait]
impl RemoteLedger for InMemoryLedger {
    async fn last_period_status(&self) -> LedgerResult<LastPeriodStatus> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::LastPeriodStatus)?;
        state.calls.push(LedgerCall::LastPeriodStatus);

        let status = match state.periods.iter().next_back() {
            None => LastPeriodStatus::none(),
            Some((id, period)) => LastPeriodStatus {
                period_id: Some(*id),
                open_marker: match period.end_marker {
                    Some(_) => None,
                    None => Some(period.last_marker.clone()),
                },
            },
        };
        Ok(status)
    }

    async fn create_period(&self, started_at: DateTime<Utc>) -> LedgerResult<PeriodId> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::CreatePeriod)?;

        state.next_period_id += 1;
        let period_id = PeriodId(state.next_period_id);
        state.periods.insert(
            period_id,
            StoredPeriod {
                last_marker: crate::wire::timestamp(started_at),
                end_marker: None,
                totals: AccumulatedTotals::default(),
                readings: 0,
            },
        );
        state.calls.push(LedgerCall::CreatePeriod { period_id });
        Ok(period_id)
    }

    async fn create_baseline_reading(&self, period_id: PeriodId) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::CreateBaselineReading)?;
        Self::period_exists(&state, period_id)?;

        if let Some(period) = state.periods.get_mut(&period_id) {
            period.readings += 1;
        }
        state.calls.push(LedgerCall::CreateBaselineReading { period_id });
        Ok(())
    }

    async fn accumulated_totals(&self, period_id: PeriodId) -> LedgerResult<AccumulatedTotals> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::AccumulatedTotals)?;
        Self::period_exists(&state, period_id)?;

        let totals = state.periods[&period_id].totals;
        state.calls.push(LedgerCall::AccumulatedTotals { period_id });
        Ok(totals)
    }

    async fn close_period(&self, period_id: PeriodId, end_marker: &str) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::ClosePeriod)?;
        Self::period_exists(&state, period_id)?;

        if let Some(period) = state.periods.get_mut(&period_id) {
            period.end_marker = Some(end_marker.to_string());
        }
        state.calls.push(LedgerCall::ClosePeriod {
            period_id,
            end_marker: end_marker.to_string(),
        });
        Ok(())
    }

    async fn update_reading(&self, period_id: PeriodId, totals: AccumulatedTotals) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::UpdateReading)?;
        Self::period_exists(&state, period_id)?;

        if let Some(period) = state.periods.get_mut(&period_id) {
            period.totals = totals;
        }
        state.calls.push(LedgerCall::UpdateReading { period_id, totals });
        Ok(())
    }

    async fn create_waste_counter(
        &self,
        period_id: PeriodId,
        category: WasteCategory,
    ) -> LedgerResult<CounterId> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::CreateWasteCounter)?;
        Self::period_exists(&state, period_id)?;

        state.next_counter_id += 1;
        let counter_id = CounterId(state.next_counter_id);
        state
            .counters
            .insert(counter_id, StoredCounter { category, count: 0 });
        state.calls.push(LedgerCall::CreateWasteCounter {
            period_id,
            category,
            counter_id,
        });
        Ok(counter_id)
    }

    async fn increment_waste_counter(&self, counter_id: CounterId) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::IncrementWasteCounter)?;

        match state.counters.get_mut(&counter_id) {
            Some(counter) => counter.count += 1,
            None => {
                return Err(LedgerError::Status {
                    status: 404,
                    body: format!("counter {} not found", counter_id),
                })
            }
        }
        state.calls.push(LedgerCall::IncrementWasteCounter { counter_id });
        Ok(())
    }

    async fn register_weight_reading(
        &self,
        period_id: PeriodId,
        sample: &WeightSample,
    ) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::RegisterWeightReading)?;
        Self::period_exists(&state, period_id)?;

        state.calls.push(LedgerCall::RegisterWeightReading {
            period_id,
            weight_g: crate::wire::round_weight(sample.weight_g),
        });
        Ok(())
    }

    async fn register_position_reading(
        &self,
        period_id: PeriodId,
        _sample: &PositionSample,
    ) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::RegisterPositionReading)?;
        Self::period_exists(&state, period_id)?;

        state
            .calls
            .push(LedgerCall::RegisterPositionReading { period_id });
        Ok(())
    }

    async fn request_backup(&self) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.begin(&mut state, LedgerOp::RequestBackup)?;
        state.calls.push(LedgerCall::RequestBackup);
        Ok(())
    }
}
