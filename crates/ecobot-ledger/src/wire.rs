// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON bodies exchanged with the accounting service.
//!
//! Field names follow the service's API exactly, including its mixed casing.

use chrono::{DateTime, SecondsFormat, Utc};
use ecobot_structures::{AccumulatedTotals, LastPeriodStatus, PeriodId};
use serde::{Deserialize, Serialize};

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Weights are stored with four decimals
pub(crate) fn round_weight(grams: f64) -> f64 {
    (grams * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPeriodBody<'a> {
    pub period_id: i64,
    pub start_hour: String,
    pub end_hour: &'a str,
    pub day_work: String,
    pub prototype_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadingBody {
    pub period_id: i64,
    pub distance_traveled: f64,
    pub weight_waste: f64,
}

impl ReadingBody {
    pub fn new(period_id: PeriodId, totals: AccumulatedTotals) -> Self {
        Self {
            period_id: period_id.0,
            distance_traveled: totals.distance_traveled,
            weight_waste: totals.weight_waste,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WeightBody {
    pub weight_data_id: i64,
    pub period_id: i64,
    #[serde(rename = "Hour_period")]
    pub hour_period: String,
    #[serde(rename = "Weight")]
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GpsBody {
    pub period_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub date_gps: String,
    #[serde(rename = "hour_UTC")]
    pub hour_utc: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WasteCounterBody {
    pub waste_collection_id: i64,
    pub period_id: i64,
    pub amount: u64,
    pub waste_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LastPeriodResponse {
    pub last_period: LastPeriodWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LastPeriodWire {
    pub period_id: i64,
    #[serde(default)]
    pub last_hour: Option<String>,
}

impl From<LastPeriodWire> for LastPeriodStatus {
    fn from(wire: LastPeriodWire) -> Self {
        // 0 is how the service says "no period yet"
        if wire.period_id == 0 {
            return LastPeriodStatus::none();
        }
        LastPeriodStatus {
            period_id: Some(PeriodId(wire.period_id)),
            open_marker: wire.last_hour.filter(|marker| !marker.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPeriodResponse {
    pub data: CreatedPeriodData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPeriodData {
    #[serde(default)]
    pub work_periods_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedCounterResponse {
    pub data: CreatedCounterData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedCounterData {
    #[serde(default)]
    pub waste_collection_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalsResponse {
    pub last_reading: TotalsWire,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TotalsWire {
    #[serde(default)]
    pub distance_traveled: f64,
    #[serde(default)]
    pub weight_waste: f64,
}

impl From<TotalsWire> for AccumulatedTotals {
    fn from(wire: TotalsWire) -> Self {
        AccumulatedTotals {
            distance_traveled: wire.distance_traveled,
            weight_waste: wire.weight_waste,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_last_period_parsing() {
        let none: LastPeriodResponse =
            serde_json::from_str(r#"{"last_period": {"period_id": 0, "last_hour": null}}"#).unwrap();
        assert_eq!(LastPeriodStatus::from(none.last_period), LastPeriodStatus::none());

        let open: LastPeriodResponse = serde_json::from_str(
            r#"{"last_period": {"period_id": 12, "last_hour": "2025-05-01T10:00:00Z"}}"#,
        )
        .unwrap();
        let status = LastPeriodStatus::from(open.last_period);
        assert_eq!(status.left_open(), Some((PeriodId(12), "2025-05-01T10:00:00Z")));

        let closed: LastPeriodResponse =
            serde_json::from_str(r#"{"last_period": {"period_id": 12, "last_hour": "  "}}"#).unwrap();
        let status = LastPeriodStatus::from(closed.last_period);
        assert!(status.exists());
        assert_eq!(status.left_open(), None);
    }

    #[test]
    fn test_weight_body_names_and_rounding() {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        let body = WeightBody {
            weight_data_id: 0,
            period_id: 3,
            hour_period: timestamp(at),
            weight: round_weight(12.345_678),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["Hour_period"], "2025-05-01T10:00:00Z");
        assert_eq!(json["Weight"], 12.3457);
    }

    #[test]
    fn test_totals_default_missing_fields() {
        let totals: TotalsResponse =
            serde_json::from_str(r#"{"last_reading": {"weight_waste": 4.5}}"#).unwrap();
        let totals = AccumulatedTotals::from(totals.last_reading);
        assert_eq!(totals.distance_traveled, 0.0);
        assert_eq!(totals.weight_waste, 4.5);
    }
}
