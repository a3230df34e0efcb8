// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use ecobot_config::BusConfig;
use ecobot_transports::{
    BusTransport, PublishOutcome, ResilientPublisher, TransportError, TransportResult,
    ZmqBusTransport,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeromq::{Socket, SocketRecv, SubSocket};

#[derive(Default, Clone)]
struct Recorded {
    messages: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    closes: Arc<Mutex<usize>>,
}

struct RecordingTransport {
    recorded: Recorded,
}

#[async_trait]
impl BusTransport for RecordingTransport {
    async fn send(&mut self, topic: &str, payload: Vec<u8>) -> TransportResult<()> {
        let value = serde_json::from_slice(&payload).unwrap();
        self.recorded
            .messages
            .lock()
            .unwrap()
            .push((topic.to_string(), value));
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        *self.recorded.closes.lock().unwrap() += 1;
        Ok(())
    }

    fn transport_type(&self) -> &str {
        "recording"
    }
}

struct FailingTransport;

#[async_trait]
impl BusTransport for FailingTransport {
    async fn send(&mut self, _topic: &str, _payload: Vec<u8>) -> TransportResult<()> {
        Err(TransportError::SendFailed("broker went away".to_string()))
    }

    async fn close(&mut self) -> TransportResult<()> {
        Err(TransportError::NotRunning)
    }

    fn transport_type(&self) -> &str {
        "failing"
    }
}

struct StalledTransport;

#[async_trait]
impl BusTransport for StalledTransport {
    async fn send(&mut self, _topic: &str, _payload: Vec<u8>) -> TransportResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }

    fn transport_type(&self) -> &str {
        "stalled"
    }
}

#[derive(Serialize)]
struct WeightPayload {
    weight: f64,
    period_id: i64,
}

fn recording_publisher() -> (ResilientPublisher, Recorded) {
    let recorded = Recorded::default();
    let publisher = ResilientPublisher::from_transport(
        Box::new(RecordingTransport {
            recorded: recorded.clone(),
        }),
        "bot-42",
        "sensors/data",
        Duration::from_secs(2),
    );
    (publisher, recorded)
}

#[tokio::test]
async fn envelope_carries_device_id_and_payload_fields() {
    let (publisher, recorded) = recording_publisher();

    let outcome = publisher
        .publish(&WeightPayload { weight: 12.5, period_id: 7 }, "weight")
        .await;
    assert_eq!(outcome, PublishOutcome::Sent);

    let messages = recorded.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    let (topic, body) = &messages[0];
    assert_eq!(topic, "weight");
    assert_eq!(body["prototype_id"], "bot-42");
    assert_eq!(body["weight"], 12.5);
    assert_eq!(body["period_id"], 7);
}

#[tokio::test]
async fn empty_topic_uses_default() {
    let (publisher, recorded) = recording_publisher();
    publisher.publish(&serde_json::json!({"ok": true}), "").await;
    assert_eq!(recorded.messages.lock().unwrap()[0].0, "sensors/data");
}

#[tokio::test]
async fn non_object_payload_is_a_failed_outcome() {
    let (publisher, recorded) = recording_publisher();
    let outcome = publisher.publish(&42u32, "weight").await;
    assert!(matches!(outcome, PublishOutcome::Failed(TransportError::Serialization(_))));
    assert!(recorded.messages.lock().unwrap().is_empty());
    assert_eq!(publisher.stats().failed, 1);
}

#[tokio::test]
async fn send_failure_is_reported_not_raised() {
    let publisher = ResilientPublisher::from_transport(
        Box::new(FailingTransport),
        "bot-42",
        "sensors/data",
        Duration::from_secs(2),
    );
    let outcome = publisher.publish(&serde_json::json!({"a": 1}), "vision").await;
    assert_eq!(
        outcome,
        PublishOutcome::Failed(TransportError::SendFailed("broker went away".to_string()))
    );
    // Still enabled: one failed publish does not change the mode
    assert!(publisher.is_enabled());
    // Close errors are swallowed
    publisher.close().await;
    assert!(!publisher.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn stalled_send_times_out() {
    let publisher = ResilientPublisher::from_transport(
        Box::new(StalledTransport),
        "bot-42",
        "sensors/data",
        Duration::from_secs(5),
    );
    let outcome = publisher.publish(&serde_json::json!({"a": 1}), "weight").await;
    assert_eq!(outcome, PublishOutcome::Failed(TransportError::Timeout));
}

#[tokio::test]
async fn close_is_idempotent_and_later_publishes_skip() {
    let (publisher, recorded) = recording_publisher();
    publisher.close().await;
    publisher.close().await;
    publisher.close().await;
    assert_eq!(*recorded.closes.lock().unwrap(), 1);

    let outcome = publisher.publish(&serde_json::json!({"a": 1}), "weight").await;
    assert_eq!(outcome, PublishOutcome::Skipped);
}

#[tokio::test]
async fn concurrent_publishers_all_delivered() {
    let (publisher, recorded) = recording_publisher();
    let publisher = Arc::new(publisher);

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let publisher = Arc::clone(&publisher);
            tokio::spawn(async move {
                publisher
                    .publish(&WeightPayload { weight: i as f64, period_id: 1 }, "weight")
                    .await
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_sent());
    }
    assert_eq!(recorded.messages.lock().unwrap().len(), 32);
    assert_eq!(publisher.stats().sent, 32);
}

#[tokio::test]
async fn unreachable_bus_yields_disabled_publisher() {
    let config = BusConfig {
        endpoint: "tcp://127.0.0.1:1".to_string(),
        connect_timeout_secs: 1,
        ..BusConfig::default()
    };
    let publisher = ResilientPublisher::connect(&config, "bot-42").await;
    assert!(!publisher.is_enabled());

    let outcome = publisher.publish(&serde_json::json!({"a": 1}), "weight").await;
    assert_eq!(outcome, PublishOutcome::Skipped);
    publisher.close().await;
}

#[tokio::test]
async fn zmq_messages_reach_a_subscriber() {
    let mut subscriber = SubSocket::new();
    let endpoint = subscriber.bind("tcp://127.0.0.1:0").await.unwrap();
    subscriber.subscribe("weight").await.unwrap();

    let transport = ZmqBusTransport::connect(&endpoint.to_string(), Duration::from_secs(2))
        .await
        .unwrap();
    let publisher = Arc::new(ResilientPublisher::from_transport(
        Box::new(transport),
        "bot-42",
        "sensors/data",
        Duration::from_secs(2),
    ));

    // PUB drops messages until the subscription has propagated; keep sending
    let sender = {
        let publisher = Arc::clone(&publisher);
        tokio::spawn(async move {
            for _ in 0..100 {
                publisher
                    .publish(&WeightPayload { weight: 3.25, period_id: 9 }, "weight")
                    .await;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
    };

    let message = tokio::time::timeout(Duration::from_secs(5), subscriber.recv())
        .await
        .expect("no message within 5s")
        .unwrap();
    sender.abort();

    let frames: Vec<Vec<u8>> = message.into_vec().into_iter().map(|b| b.to_vec()).collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], b"weight".to_vec());
    let body: serde_json::Value = serde_json::from_slice(&frames[1]).unwrap();
    assert_eq!(body["prototype_id"], "bot-42");
    assert_eq!(body["period_id"], 9);

    publisher.close().await;
}
