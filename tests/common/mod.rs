#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use simple_cloudevent::SimpleCloudEvent;

pub const FIXED_ID: &str = "6f589627-448c-4586-85b3-fca406aacf1b";
pub const FIXED_TIME: &str = "2021-12-16T06:59:11.135685+00:00";

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// An event with every attribute set to a valid value.
pub fn full_event() -> SimpleCloudEvent {
    SimpleCloudEvent::new()
        .with_id(FIXED_ID)
        .with_source("/orders/service")
        .with_subject("order-42")
        .with_time(FIXED_TIME)
        .with_type("order.placed")
        .with_data(object(json!({"total": 99.5, "items": ["a", "b"]})))
}

/// Assert `text` parses as RFC 3339 and lies within a few seconds of now.
pub fn assert_recent(text: &str) {
    let parsed = DateTime::parse_from_rfc3339(text)
        .unwrap_or_else(|e| panic!("time {text} is not RFC 3339: {e}"));
    let age = Utc::now().signed_duration_since(parsed);
    assert!(
        age.num_seconds().abs() <= 5,
        "time {text} should be within 5 seconds of now, off by {age}"
    );
}
