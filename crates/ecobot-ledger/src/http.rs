// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the accounting service
//!
//! Endpoints hang off one base URL:
//! - `{base}/workPeriods/...` work periods and their readings
//! - `{base}/sensors/...` sensor readings and waste counters
//! - `{base}/backup/` backup trigger

use crate::error::{LedgerError, LedgerResult};
use crate::traits::RemoteLedger;
use crate::wire::{
    round_weight, timestamp, CreatedCounterResponse, CreatedPeriodResponse, GpsBody,
    LastPeriodResponse, NewPeriodBody, ReadingBody, TotalsResponse, WasteCounterBody, WeightBody,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecobot_config::LedgerConfig;
use ecobot_structures::{
    day_label, AccumulatedTotals, CounterId, LastPeriodStatus, PeriodId, PositionSample,
    WasteCategory, WeightSample,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
    device_id: String,
}

impl HttpLedgerClient {
    /// Build a client; every request carries the configured timeout
    pub fn new(config: &LedgerConfig, device_id: impl Into<String>) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            device_id: device_id.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn work_periods_url(&self, path: &str) -> String {
        format!("{}/workPeriods/{}", self.base_url, path)
    }

    fn sensors_url(&self, path: &str) -> String {
        format!("{}/sensors/{}", self.base_url, path)
    }

    /// Send and turn non-2xx answers into `LedgerError::Status`
    async fn send(&self, request: RequestBuilder, what: &str) -> LedgerResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("[LEDGER] {} failed with {}: {}", what, status, body);
            return Err(LedgerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!("[LEDGER] {} -> {}", what, status);
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> LedgerResult<T> {
        let response = self.send(request, what).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::InvalidResponse(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl RemoteLedger for HttpLedgerClient {
    async fn last_period_status(&self) -> LedgerResult<LastPeriodStatus> {
        let response: LastPeriodResponse = self
            .send_json(self.client.get(self.work_periods_url("")), "last period")
            .await?;
        Ok(response.last_period.into())
    }

    async fn create_period(&self, started_at: DateTime<Utc>) -> LedgerResult<PeriodId> {
        let body = NewPeriodBody {
            period_id: 0,
            start_hour: timestamp(started_at),
            end_hour: "",
            day_work: day_label(started_at),
            prototype_id: &self.device_id,
        };
        let response: CreatedPeriodResponse = self
            .send_json(
                self.client.post(self.work_periods_url("")).json(&body),
                "create period",
            )
            .await?;

        match response.data.work_periods_id {
            0 => Err(LedgerError::InvalidResponse(
                "service returned period id 0".to_string(),
            )),
            id => Ok(PeriodId(id)),
        }
    }

    async fn create_baseline_reading(&self, period_id: PeriodId) -> LedgerResult<()> {
        let body = ReadingBody::new(period_id, AccumulatedTotals::default());
        self.send(
            self.client.post(self.work_periods_url("readings")).json(&body),
            "baseline reading",
        )
        .await?;
        Ok(())
    }

    async fn accumulated_totals(&self, period_id: PeriodId) -> LedgerResult<AccumulatedTotals> {
        let response: TotalsResponse = self
            .send_json(
                self.client
                    .get(self.work_periods_url("readingsGlobal"))
                    .query(&[("id", period_id.to_string())]),
                "accumulated totals",
            )
            .await?;
        Ok(response.last_reading.into())
    }

    async fn close_period(&self, period_id: PeriodId, end_marker: &str) -> LedgerResult<()> {
        self.send(
            self.client
                .patch(self.work_periods_url(""))
                .query(&[("endHour", end_marker.to_string()), ("id", period_id.to_string())]),
            "close period",
        )
        .await?;
        Ok(())
    }

    async fn update_reading(&self, period_id: PeriodId, totals: AccumulatedTotals) -> LedgerResult<()> {
        let body = ReadingBody::new(period_id, totals);
        self.send(
            self.client.put(self.work_periods_url("")).json(&body),
            "update reading",
        )
        .await?;
        Ok(())
    }

    async fn create_waste_counter(
        &self,
        period_id: PeriodId,
        category: WasteCategory,
    ) -> LedgerResult<CounterId> {
        let body = WasteCounterBody {
            waste_collection_id: 0,
            period_id: period_id.0,
            amount: 0,
            waste_id: category.ledger_waste_id(),
        };
        let response: CreatedCounterResponse = self
            .send_json(
                self.client.post(self.sensors_url("waste")).json(&body),
                "create waste counter",
            )
            .await?;

        match response.data.waste_collection_id {
            0 => Err(LedgerError::InvalidResponse(format!(
                "service returned counter id 0 for {}",
                category
            ))),
            id => Ok(CounterId(id)),
        }
    }

    async fn increment_waste_counter(&self, counter_id: CounterId) -> LedgerResult<()> {
        self.send(
            self.client
                .patch(self.sensors_url(""))
                .query(&[("Id", counter_id.to_string())]),
            "increment waste counter",
        )
        .await?;
        Ok(())
    }

    async fn register_weight_reading(
        &self,
        period_id: PeriodId,
        sample: &WeightSample,
    ) -> LedgerResult<()> {
        let body = WeightBody {
            weight_data_id: 0,
            period_id: period_id.0,
            hour_period: timestamp(sample.observed_at),
            weight: round_weight(sample.weight_g),
        };
        self.send(
            self.client.post(self.sensors_url("weight")).json(&body),
            "weight reading",
        )
        .await?;
        Ok(())
    }

    async fn register_position_reading(
        &self,
        period_id: PeriodId,
        sample: &PositionSample,
    ) -> LedgerResult<()> {
        let body = GpsBody {
            period_id: period_id.0,
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude_m,
            speed: sample.speed_kmh,
            date_gps: sample.observed_at.format("%Y-%m-%d").to_string(),
            hour_utc: timestamp(sample.observed_at),
        };
        self.send(
            self.client.post(self.sensors_url("gps")).json(&body),
            "position reading",
        )
        .await?;
        Ok(())
    }

    async fn request_backup(&self) -> LedgerResult<()> {
        self.send(
            self.client.get(format!("{}/backup/", self.base_url)),
            "backup",
        )
        .await?;
        Ok(())
    }
}
