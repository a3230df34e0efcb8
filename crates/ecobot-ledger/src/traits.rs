// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The remote accounting service as seen by the collector.

use crate::error::LedgerResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecobot_structures::{
    AccumulatedTotals, CounterId, LastPeriodStatus, PeriodId, PositionSample, WasteCategory,
    WeightSample,
};

/// Remote ledger operations. Every call may fail with a transient error.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Most recent period for this device
    async fn last_period_status(&self) -> LedgerResult<LastPeriodStatus>;

    /// Open a new period starting at `started_at`
    async fn create_period(&self, started_at: DateTime<Utc>) -> LedgerResult<PeriodId>;

    /// Empty reading row (zero distance, zero weight) for a new period
    async fn create_baseline_reading(&self, period_id: PeriodId) -> LedgerResult<()>;

    async fn accumulated_totals(&self, period_id: PeriodId) -> LedgerResult<AccumulatedTotals>;

    /// Mark a period as ended at `end_marker`
    async fn close_period(&self, period_id: PeriodId, end_marker: &str) -> LedgerResult<()>;

    /// End-of-period reading update
    async fn update_reading(&self, period_id: PeriodId, totals: AccumulatedTotals) -> LedgerResult<()>;

    async fn create_waste_counter(
        &self,
        period_id: PeriodId,
        category: WasteCategory,
    ) -> LedgerResult<CounterId>;

    async fn increment_waste_counter(&self, counter_id: CounterId) -> LedgerResult<()>;

    async fn register_weight_reading(
        &self,
        period_id: PeriodId,
        sample: &WeightSample,
    ) -> LedgerResult<()>;

    async fn register_position_reading(
        &self,
        period_id: PeriodId,
        sample: &PositionSample,
    ) -> LedgerResult<()>;

    /// Ask the service to snapshot its data
    async fn request_backup(&self) -> LedgerResult<()>;
}
