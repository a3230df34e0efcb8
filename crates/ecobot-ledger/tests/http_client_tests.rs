// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HTTP client against a mock accounting service

use chrono::{TimeZone, Utc};
use ecobot_config::LedgerConfig;
use ecobot_ledger::{HttpLedgerClient, LedgerError, RemoteLedger};
use ecobot_structures::{
    AccumulatedTotals, CounterId, LastPeriodStatus, PeriodId, PositionSample, WasteCategory,
    WeightSample,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpLedgerClient {
    let config = LedgerConfig {
        base_url: server.uri(),
        request_timeout_secs: 1,
        ..Default::default()
    };
    HttpLedgerClient::new(&config, "bot-7").unwrap()
}

#[tokio::test]
async fn test_last_period_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workPeriods/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"last_period": {"period_id": 0, "last_hour": ""}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server).await.last_period_status().await.unwrap();
    assert_eq!(status, LastPeriodStatus::none());
}

#[tokio::test]
async fn test_last_period_left_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workPeriods/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"last_period": {"period_id": 31, "last_hour": "2025-06-02T16:45:00Z"}}),
        ))
        .mount(&server)
        .await;

    let status = client_for(&server).await.last_period_status().await.unwrap();
    assert_eq!(status.left_open(), Some((PeriodId(31), "2025-06-02T16:45:00Z")));
}

#[tokio::test]
async fn test_create_period_body_and_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workPeriods/"))
        .and(body_partial_json(json!({
            "period_id": 0,
            "start_hour": "2025-06-02T08:00:00Z",
            "end_hour": "",
            "day_work": "Mon",
            "prototype_id": "bot-7"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"work_periods_id": 32}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let started_at = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
    let id = client_for(&server).await.create_period(started_at).await.unwrap();
    assert_eq!(id, PeriodId(32));
}

#[tokio::test]
async fn test_create_period_zero_id_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workPeriods/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"work_periods_id": 0}})),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).await.create_period(Utc::now()).await;
    assert!(matches!(result, Err(LedgerError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_close_period_query() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/workPeriods/"))
        .and(query_param("endHour", "2025-06-02T16:45:00Z"))
        .and(query_param("id", "31"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .await
        .close_period(PeriodId(31), "2025-06-02T16:45:00Z")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_totals_and_update_reading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workPeriods/readingsGlobal"))
        .and(query_param("id", "31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"last_reading": {"distance_traveled": 812.5, "weight_waste": 2.25}}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/workPeriods/"))
        .and(body_json(json!({
            "period_id": 31,
            "distance_traveled": 812.5,
            "weight_waste": 2.25
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let totals = client.accumulated_totals(PeriodId(31)).await.unwrap();
    assert_eq!(
        totals,
        AccumulatedTotals {
            distance_traveled: 812.5,
            weight_waste: 2.25
        }
    );
    client.update_reading(PeriodId(31), totals).await.unwrap();
}

#[tokio::test]
async fn test_baseline_reading_is_zeroed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workPeriods/readings"))
        .and(body_json(json!({
            "period_id": 32,
            "distance_traveled": 0.0,
            "weight_waste": 0.0
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .await
        .create_baseline_reading(PeriodId(32))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_waste_counter_create_and_increment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sensors/waste"))
        .and(body_json(json!({
            "waste_collection_id": 0,
            "period_id": 32,
            "amount": 0,
            "waste_id": 2
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"waste_collection_id": 90}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/sensors/"))
        .and(query_param("Id", "90"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let counter = client
        .create_waste_counter(PeriodId(32), WasteCategory::Can)
        .await
        .unwrap();
    assert_eq!(counter, CounterId(90));
    client.increment_waste_counter(counter).await.unwrap();
}

#[tokio::test]
async fn test_weight_reading_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sensors/weight"))
        .and(body_json(json!({
            "weight_data_id": 0,
            "period_id": 32,
            "Hour_period": "2025-06-02T09:15:30Z",
            "Weight": 14.1235
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let at = Utc.with_ymd_and_hms(2025, 6, 2, 9, 15, 30).unwrap();
    let sample = WeightSample::new(14.123_456, at).unwrap();
    client_for(&server)
        .await
        .register_weight_reading(PeriodId(32), &sample)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_position_reading_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sensors/gps"))
        .and(body_json(json!({
            "period_id": 32,
            "latitude": 4.6097,
            "longitude": -74.0817,
            "altitude": 2640.0,
            "speed": 3.5,
            "date_gps": "2025-06-02",
            "hour_UTC": "2025-06-02T09:15:30Z"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let at = Utc.with_ymd_and_hms(2025, 6, 2, 9, 15, 30).unwrap();
    let sample = PositionSample::new(4.6097, -74.0817, 2640.0, 3.5, at).unwrap();
    client_for(&server)
        .await
        .register_position_reading(PeriodId(32), &sample)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backup/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.request_backup().await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Status {
            status: 503,
            body: "maintenance".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_error_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/sensors/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .increment_waste_counter(CounterId(5))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workPeriods/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).await.last_period_status().await;
    assert!(matches!(result, Err(LedgerError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workPeriods/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"last_period": {"period_id": 0}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).await.last_period_status().await;
    match result {
        Err(e) => assert!(e.is_retryable(), "expected a transient error, got {e}"),
        Ok(status) => panic!("expected timeout, got {:?}", status),
    }
}
