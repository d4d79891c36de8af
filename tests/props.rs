use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use simple_cloudevent::{SimpleCloudEvent, from_queue_message, to_queue_message, to_structured};

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./:_-]{1,24}"
}

fn arb_time() -> impl Strategy<Value = String> {
    // 2000-01-01 .. 2100-01-01, microsecond precision
    (946_684_800i64..4_102_444_800i64, 0u32..1_000_000u32).prop_map(|(secs, micros)| {
        Utc.timestamp_opt(secs, micros * 1000)
            .unwrap()
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
    })
}

fn arb_data() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect::<Map<String, Value>>()
    })
}

fn arb_event() -> impl Strategy<Value = SimpleCloudEvent> {
    (
        arb_text(),
        proptest::option::of(arb_text()),
        proptest::option::of(arb_text()),
        arb_time(),
        proptest::option::of(arb_text()),
        arb_data(),
    )
        .prop_map(|(id, source, subject, time, event_type, data)| SimpleCloudEvent {
            id: Some(id),
            source,
            subject,
            time: Some(time.into()),
            event_type,
            data,
        })
}

// With id and time set, structuring is deterministic.
proptest! {
    #[test]
    fn prop_structured_idempotent(event in arb_event()) {
        let first = to_structured(&event).unwrap();
        let second = to_structured(&event).unwrap();
        prop_assert_eq!(first, second);
    }
}

// Encoding then decoding reproduces every attribute.
proptest! {
    #[test]
    fn prop_queue_message_round_trip(event in arb_event()) {
        let message = to_queue_message(&event).unwrap();
        let decoded = from_queue_message(&message).unwrap();
        prop_assert_eq!(decoded, event);
    }
}

// The data key is present exactly when the payload is non-empty.
proptest! {
    #[test]
    fn prop_data_key_tracks_payload(event in arb_event()) {
        let structured = to_structured(&event).unwrap();
        prop_assert_eq!(structured.contains_key("data"), !event.data.is_empty());
    }
}
