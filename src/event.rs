use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// The CloudEvents specification version this crate reads and writes.
pub const SPEC_VERSION: &str = "1.0";

/// The only `datacontenttype` this crate produces.
pub const DATA_CONTENT_TYPE: &str = "application/json";

/// A minimal CloudEvents v1.0 envelope.
///
/// Every attribute is optional at construction. [`to_structured`] fills in a
/// fresh `id` and `time` when they are missing, so the wire form always has
/// concrete values for both.
///
/// `specversion` and `datacontenttype` are not stored on the value. They are
/// constants of the type, see [`SimpleCloudEvent::spec_version`] and
/// [`SimpleCloudEvent::data_content_type`].
///
/// [`to_structured`]: crate::to_structured
///
/// # Examples
///
/// ```
/// use simple_cloudevent::SimpleCloudEvent;
/// use serde_json::json;
///
/// let event = SimpleCloudEvent::new()
///     .with_source("/orders")
///     .with_type("order.placed")
///     .with_data(json!({"total": 42}).as_object().unwrap().clone());
///
/// assert_eq!(event.event_type.as_deref(), Some("order.placed"));
/// assert_eq!(event.id, None);
/// assert_eq!(SimpleCloudEvent::spec_version(), "1.0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleCloudEvent {
    /// Unique event identifier. Generated at serialization time when absent.
    #[serde(default)]
    pub id: Option<String>,

    /// URI identifying the producer.
    #[serde(default)]
    pub source: Option<String>,

    /// Subject of the event within the producer's context.
    #[serde(default)]
    pub subject: Option<String>,

    /// Occurrence time. Generated at serialization time when absent.
    #[serde(default)]
    pub time: Option<EventTime>,

    /// The event type identifier.
    ///
    /// Carried as `"type"` on the wire.
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,

    /// Event payload. Omitted from the wire form when empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
}

impl SimpleCloudEvent {
    /// Same as [`SPEC_VERSION`].
    pub const SPEC_VERSION: &'static str = SPEC_VERSION;

    /// Same as [`DATA_CONTENT_TYPE`].
    pub const DATA_CONTENT_TYPE: &'static str = DATA_CONTENT_TYPE;

    /// Create an event with every attribute absent and an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// The CloudEvents version of every `SimpleCloudEvent`.
    pub const fn version() -> &'static str {
        Self::SPEC_VERSION
    }

    /// Alias for [`SimpleCloudEvent::version`], named after the wire key.
    pub const fn spec_version() -> &'static str {
        Self::version()
    }

    /// JSON is the only supported payload encoding.
    pub const fn data_content_type() -> &'static str {
        Self::DATA_CONTENT_TYPE
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the occurrence time, either as RFC 3339 text or a native timestamp.
    ///
    /// Text is not validated here; [`to_structured`](crate::to_structured)
    /// rejects it if it is not strict RFC 3339.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use simple_cloudevent::{EventTime, SimpleCloudEvent};
    ///
    /// let text = SimpleCloudEvent::new().with_time("2021-12-16T06:59:11+00:00");
    /// assert_eq!(text.time, Some(EventTime::Text("2021-12-16T06:59:11+00:00".into())));
    ///
    /// let native = SimpleCloudEvent::new()
    ///     .with_time(Utc.with_ymd_and_hms(2021, 12, 16, 6, 59, 11).unwrap());
    /// assert_eq!(
    ///     native.time.unwrap().as_text(),
    ///     "2021-12-16T06:59:11+00:00"
    /// );
    /// ```
    pub fn with_time(mut self, time: impl Into<EventTime>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }
}

/// The `time` attribute of an event.
///
/// Producers may hand over preformatted text or a native timestamp. Events
/// decoded from a queue message always carry [`EventTime::Text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// Caller-supplied text, validated as strict RFC 3339 on serialization.
    Text(String),
    /// A native timestamp, rendered as RFC 3339 text on serialization.
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    /// The text this time takes on the wire.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            EventTime::Text(text) => Cow::Borrowed(text.as_str()),
            EventTime::DateTime(dt) => {
                Cow::Owned(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, EventTime::Text(text) if text.is_empty())
    }
}

impl From<String> for EventTime {
    fn from(text: String) -> Self {
        EventTime::Text(text)
    }
}

impl From<&str> for EventTime {
    fn from(text: &str) -> Self {
        EventTime::Text(text.to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for EventTime {
    fn from(dt: DateTime<Tz>) -> Self {
        EventTime::DateTime(dt.fixed_offset())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(EventTime::Text)
    }
}

// `"data": null` on the wire means no payload.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
