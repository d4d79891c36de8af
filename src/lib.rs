//! A small, opinionated take on CloudEvents v1.0.
//!
//! [`SimpleCloudEvent`] is the envelope; [`to_queue_message`] and
//! [`from_queue_message`] move it to and from the JSON bytes a queue carries.
//! Only JSON payloads are supported and only spec version `1.0` is accepted.
//!
//! ```
//! use simple_cloudevent::{from_queue_message, to_queue_message, SimpleCloudEvent};
//!
//! let event = SimpleCloudEvent::new()
//!     .with_id("evt-1")
//!     .with_source("/billing")
//!     .with_type("invoice.paid")
//!     .with_time("2024-03-01T12:00:00Z");
//!
//! let bytes = to_queue_message(&event).unwrap();
//! let decoded = from_queue_message(&bytes).unwrap();
//! assert_eq!(decoded, event);
//! ```

mod codec;
mod error;
mod event;

pub use codec::{
    StructuredOptions, from_queue_message, to_queue_message, to_structured, to_structured_with,
};
pub use error::{Error, Result};
pub use event::{DATA_CONTENT_TYPE, EventTime, SPEC_VERSION, SimpleCloudEvent};
