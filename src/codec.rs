//! Conversion between [`SimpleCloudEvent`] and its queue message form.
//!
//! The structured form is a JSON object with every CloudEvents attribute this
//! crate knows about. `specversion` and `datacontenttype` always carry the
//! crate constants, whatever the caller had in mind. `data` is left out when
//! the payload is empty.

use crate::error::{Error, Result};
use crate::event::{DATA_CONTENT_TYPE, EventTime, SPEC_VERSION, SimpleCloudEvent};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Options for [`to_structured_with`].
///
/// The default leaves the input event untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredOptions {
    /// Write a generated `id` or `time` back onto the input event.
    pub update: bool,
}

impl StructuredOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable back-filling of generated attributes.
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }
}

/// Build the structured form of an event without modifying it.
///
/// Missing `id` and `time` values are generated: a random UUID v4 and the
/// current UTC time. Call this twice on an event without an `id` and you get
/// two different ids; use [`to_structured_with`] to keep them.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `time` is text that is not strict
/// RFC 3339.
///
/// # Examples
///
/// ```
/// use simple_cloudevent::{to_structured, SimpleCloudEvent};
///
/// let event = SimpleCloudEvent::new().with_type("user.created");
/// let structured = to_structured(&event).unwrap();
///
/// assert_eq!(structured["specversion"], "1.0");
/// assert_eq!(structured["type"], "user.created");
/// assert!(structured["source"].is_null());
/// assert!(structured["id"].as_str().is_some_and(|id| !id.is_empty()));
/// assert!(!structured.contains_key("data"));
/// ```
pub fn to_structured(event: &SimpleCloudEvent) -> Result<Map<String, Value>> {
    structure(event).map(|(structured, _)| structured)
}

/// Build the structured form of an event, applying `options`.
///
/// With `options.update` set, any `id` or `time` generated for the output is
/// also stored on `event`, so a later call produces the same values. Nothing
/// else on the event is touched, and attributes that were already present are
/// never rewritten.
///
/// # Examples
///
/// ```
/// use simple_cloudevent::{to_structured_with, SimpleCloudEvent, StructuredOptions};
///
/// let mut event = SimpleCloudEvent::new();
/// let options = StructuredOptions::new().with_update(true);
/// let structured = to_structured_with(&mut event, options).unwrap();
///
/// assert_eq!(event.id.as_deref(), structured["id"].as_str());
/// assert_eq!(to_structured_with(&mut event, options).unwrap(), structured);
/// ```
pub fn to_structured_with(
    event: &mut SimpleCloudEvent,
    options: StructuredOptions,
) -> Result<Map<String, Value>> {
    let (structured, generated) = structure(event)?;

    if options.update {
        if let Some(id) = generated.id {
            event.id = Some(id);
        }
        if let Some(time) = generated.time {
            event.time = Some(EventTime::Text(time));
        }
    }

    Ok(structured)
}

/// Encode an event as a UTF-8 JSON queue message.
///
/// The event itself is not modified, so generated `id`/`time` values only
/// exist in the returned bytes.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an invalid `time`, or
/// [`Error::Serialization`] if JSON encoding fails.
pub fn to_queue_message(event: &SimpleCloudEvent) -> Result<Vec<u8>> {
    let structured = to_structured(event)?;
    let message = serde_json::to_vec(&structured)?;
    debug!(
        "encoded event {} into {} byte queue message",
        structured["id"].as_str().unwrap_or_default(),
        message.len()
    );
    Ok(message)
}

/// Decode a queue message produced by [`to_queue_message`].
///
/// `datacontenttype` is dropped, `specversion` must be exactly `"1.0"`, and
/// every remaining key must be one of `id`, `source`, `subject`, `time`,
/// `type`, `data`.
///
/// # Errors
///
/// - [`Error::InvalidEvent`] if the bytes are not UTF-8 JSON, the top-level
///   value is not an object, or the remaining fields do not form an event
///   (unknown key, wrong value type).
/// - [`Error::VersionMismatch`] if `specversion` is missing or different.
///
/// # Examples
///
/// ```
/// use simple_cloudevent::{from_queue_message, Error};
///
/// let msg = br#"{"id": "abc", "specversion": "1.0", "type": "ping"}"#;
/// let event = from_queue_message(msg).unwrap();
/// assert_eq!(event.id.as_deref(), Some("abc"));
///
/// let old = br#"{"id": "abc", "specversion": "0.3"}"#;
/// assert!(matches!(from_queue_message(old), Err(Error::VersionMismatch { .. })));
/// ```
pub fn from_queue_message(message: &[u8]) -> Result<SimpleCloudEvent> {
    let text = std::str::from_utf8(message)
        .map_err(|e| Error::invalid_event(format!("message is not valid UTF-8: {e}")))?;
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::invalid_event_from("message is not valid JSON", e))?;

    let Value::Object(mut fields) = value else {
        return Err(Error::invalid_event("message is not a JSON object"));
    };

    fields.remove("datacontenttype");

    match fields.remove("specversion") {
        Some(Value::String(version)) if version == SPEC_VERSION => {}
        received => {
            return Err(Error::VersionMismatch {
                expected: SPEC_VERSION,
                received: received.map(|value| match value {
                    Value::String(version) => version,
                    other => other.to_string(),
                }),
            });
        }
    }

    let event: SimpleCloudEvent = serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::invalid_event_from("message fields do not form an event", e))?;

    debug!(
        "decoded event {} from {} byte queue message",
        event.id.as_deref().unwrap_or("<none>"),
        message.len()
    );
    Ok(event)
}

/// Values generated while structuring, so the caller can back-fill them.
#[derive(Default)]
struct Generated {
    id: Option<String>,
    time: Option<String>,
}

fn structure(event: &SimpleCloudEvent) -> Result<(Map<String, Value>, Generated)> {
    if let Some(EventTime::Text(text)) = &event.time {
        if !text.is_empty() && !is_strict_rfc3339(text) {
            return Err(Error::Validation {
                field: "time",
                message: "must be in strict ISO 8601 / RFC 3339 format",
            });
        }
    }

    let mut generated = Generated::default();

    let id = match event.id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = Uuid::new_v4().to_string();
            debug!("generated id {id} for event without one");
            generated.id = Some(id.clone());
            id
        }
    };

    // CloudEvents allows a null time; the queue format always carries one.
    let time = match &event.time {
        Some(time) if !time.is_empty() => time.as_text().into_owned(),
        _ => {
            let time = format_utc(Utc::now());
            debug!("stamped event {id} with time {time}");
            generated.time = Some(time.clone());
            time
        }
    };

    let mut structured = Map::new();
    structured.insert("data".into(), Value::Object(event.data.clone()));
    structured.insert("datacontenttype".into(), DATA_CONTENT_TYPE.into());
    structured.insert("id".into(), id.into());
    structured.insert("source".into(), optional(&event.source));
    structured.insert("specversion".into(), SPEC_VERSION.into());
    structured.insert("subject".into(), optional(&event.subject));
    structured.insert("time".into(), time.into());
    structured.insert("type".into(), optional(&event.event_type));

    if event.data.is_empty() {
        structured.remove("data");
    }

    Ok((structured, generated))
}

fn optional(value: &Option<String>) -> Value {
    value.as_deref().map_or(Value::Null, Value::from)
}

/// Render a UTC timestamp with microseconds and a `+00:00` offset.
pub(crate) fn format_utc(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// `YYYY-MM-DDTHH:MM:SS[.frac](Z|+HH:MM|-HH:MM)`, with in-range fields.
///
/// chrono's RFC 3339 parser also accepts a lowercase or space separator and a
/// lowercase `z`, so the layout is checked first.
pub(crate) fn is_strict_rfc3339(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 20 {
        return false;
    }

    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    let layout_ok = digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && bytes[10] == b'T'
        && digits(11..13)
        && bytes[13] == b':'
        && digits(14..16)
        && bytes[16] == b':'
        && digits(17..19);
    if !layout_ok {
        return false;
    }

    let mut rest = &bytes[19..];
    if let Some(fraction) = rest.strip_prefix(b".") {
        let len = fraction.iter().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 {
            return false;
        }
        rest = &fraction[len..];
    }

    let offset_ok = match rest {
        b"Z" => true,
        [sign, h1, h2, b':', m1, m2] => {
            matches!(sign, b'+' | b'-') && [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    };

    offset_ok && DateTime::parse_from_rfc3339(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_strict_rfc3339_accepts() {
        for text in [
            "2021-12-16T06:59:11Z",
            "2021-12-16T06:59:11+00:00",
            "2021-12-16T06:59:11.135685+00:00",
            "2021-12-16T06:59:11.1-07:30",
            "1985-04-12T23:20:50.52Z",
        ] {
            assert!(is_strict_rfc3339(text), "{text} should be accepted");
        }
    }

    #[test]
    fn test_strict_rfc3339_rejects() {
        for text in [
            "not-a-time",
            "2021-12-16",
            "2021-12-16T06:59:11",
            "2021-12-16 06:59:11Z",
            "2021-12-16t06:59:11Z",
            "2021-12-16T06:59:11z",
            "2021-12-16T06:59:11+0000",
            "2021-12-16T06:59:11.Z",
            "2021-13-16T06:59:11Z",
            "2021-12-32T06:59:11Z",
            "2021-12-16T25:59:11Z",
            "2021-12-16T06:59:11+00:00 ",
        ] {
            assert!(!is_strict_rfc3339(text), "{text} should be rejected");
        }
    }

    #[test]
    fn test_format_utc_matches_isoformat() {
        let ts = Utc
            .with_ymd_and_hms(2021, 12, 16, 6, 59, 11)
            .unwrap()
            .with_nanosecond(135_685_000)
            .unwrap();
        assert_eq!(format_utc(ts), "2021-12-16T06:59:11.135685+00:00");
    }

    #[test]
    fn test_generated_time_is_strict() {
        assert!(is_strict_rfc3339(&format_utc(Utc::now())));
    }
}
