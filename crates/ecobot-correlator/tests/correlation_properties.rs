// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, TimeZone, Utc};
use ecobot_correlator::{CorrelatorConfig, EventCorrelator};
use ecobot_structures::{
    DetectedClass, Detection, DetectionFrame, DisposalEvent, WasteCategory, WeightSample,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn t(millis: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap() + chrono::Duration::milliseconds(millis)
}

fn detection(classes: &[DetectedClass], at: i64) -> DetectionFrame {
    DetectionFrame::new(
        classes
            .iter()
            .map(|c| Detection::new(*c, 0.8).unwrap())
            .collect(),
        t(at),
    )
}

fn weight(grams: f64, at: i64) -> WeightSample {
    WeightSample::new(grams, t(at)).unwrap()
}

fn correlator() -> EventCorrelator {
    EventCorrelator::new(CorrelatorConfig {
        weight_threshold_g: 5.0,
        expiry_window: Duration::from_secs(10),
    })
}

#[test]
fn sub_threshold_sequences_never_confirm() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Pet], 0));
    correlator.on_detection(&detection(&[DetectedClass::Can], 100));

    // Slow creep: every step below threshold even though the total is large
    let mut grams = 0.0;
    for step in 1..=40 {
        grams += 4.99;
        assert!(correlator.on_weight(&weight(grams, 100 + step * 50)).is_empty());
    }
    // Noise around a level
    for (step, grams) in [200.0, 198.0, 202.9, 199.5, 202.0].iter().enumerate() {
        let _ = correlator.on_weight(&weight(*grams, 3_000 + step as i64 * 10));
    }
    let state = correlator.snapshot();
    assert!(state.pending_pet && state.pending_can);
}

#[test]
fn qualifying_weight_confirms_once_per_pending_category() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Can], 0));

    let sample = weight(14.0, 9_999);
    let events = correlator.on_weight(&sample);
    assert_eq!(events, vec![DisposalEvent::new(WasteCategory::Can, t(9_999))]);

    let state = correlator.snapshot();
    assert!(!state.has_pending());
    assert!(state.last_detection_at.is_none());

    // Replaying the same sample emits nothing further
    assert!(correlator.on_weight(&sample).is_empty());
}

#[test]
fn weight_after_window_is_ignored_and_clears_state() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Pet], 0));

    assert!(correlator.on_weight(&weight(50.0, 10_001)).is_empty());
    let state = correlator.snapshot();
    assert!(!state.has_pending());
    assert!(state.last_detection_at.is_none());
    assert_eq!(state.last_weight, 50.0);
}

#[test]
fn weight_exactly_at_window_edge_confirms() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Pet], 0));
    assert_eq!(correlator.on_weight(&weight(9.0, 10_000)).len(), 1);
}

#[test]
fn ambiguous_frame_confirms_both_categories_in_one_call() {
    let correlator = correlator();
    correlator.on_detection(&detection(
        &[DetectedClass::Pet, DetectedClass::Pet, DetectedClass::Pet],
        0,
    ));
    let state = correlator.snapshot();
    assert!(state.pending_pet && state.pending_can);

    let events = correlator.on_weight(&weight(30.0, 1_000));
    assert_eq!(
        events,
        vec![
            DisposalEvent::new(WasteCategory::Pet, t(1_000)),
            DisposalEvent::new(WasteCategory::Can, t(1_000)),
        ]
    );
    assert!(correlator.on_weight(&weight(60.0, 1_500)).is_empty());
}

#[test]
fn two_object_frame_is_not_ambiguous() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Pet, DetectedClass::Can], 0));
    let events = correlator.on_weight(&weight(30.0, 1_000));
    assert_eq!(events, vec![DisposalEvent::new(WasteCategory::Pet, t(1_000))]);
}

#[test]
fn separate_detections_accumulate_flags() {
    let correlator = correlator();
    correlator.on_detection(&detection(&[DetectedClass::Pet], 0));
    correlator.on_detection(&detection(&[DetectedClass::Can], 2_000));
    let events = correlator.on_weight(&weight(12.0, 3_000));
    assert_eq!(events.len(), 2);
}

#[test]
fn concurrent_producers_never_double_confirm() {
    // Every detection episode is followed by several racing qualifying weights.
    // Only one of them may confirm the episode.
    let correlator = Arc::new(correlator());
    let episodes = 200;

    for episode in 0..episodes {
        let base = episode as i64 * 20_000;
        correlator.on_detection(&detection(&[DetectedClass::Can], base));
        // Reset the weight baseline so the next jumps qualify
        correlator.on_weight(&weight(0.0, base));
        correlator.on_detection(&detection(&[DetectedClass::Can], base));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let correlator = Arc::clone(&correlator);
                thread::spawn(move || {
                    correlator
                        .on_weight(&weight(10.0 * (worker + 1) as f64, base + 100))
                        .len()
                })
            })
            .collect();

        let confirmed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(confirmed, 1, "episode {} confirmed {} times", episode, confirmed);
        assert!(!correlator.snapshot().has_pending());
    }
}

#[test]
fn concurrent_detection_and_weight_keep_invariant() {
    let correlator = Arc::new(correlator());

    let detector = {
        let correlator = Arc::clone(&correlator);
        thread::spawn(move || {
            for i in 0..2_000i64 {
                let classes: &[DetectedClass] = match i % 4 {
                    0 => &[DetectedClass::Pet],
                    1 => &[DetectedClass::Can],
                    2 => &[],
                    _ => &[DetectedClass::Can, DetectedClass::Pet, DetectedClass::Can],
                };
                correlator.on_detection(&detection(classes, i * 7));
            }
        })
    };
    let scale = {
        let correlator = Arc::clone(&correlator);
        thread::spawn(move || {
            let mut total = 0;
            for i in 0..2_000i64 {
                let grams = if i % 3 == 0 { 0.0 } else { (i % 50) as f64 * 3.0 };
                total += correlator.on_weight(&weight(grams, i * 7)).len();
            }
            total
        })
    };

    detector.join().unwrap();
    let _confirmed = scale.join().unwrap();

    let state = correlator.snapshot();
    assert_eq!(state.last_detection_at.is_some(), state.has_pending());
}
