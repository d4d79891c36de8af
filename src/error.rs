use thiserror::Error;

/// Convenience alias used by every fallible operation in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while structuring, encoding, or decoding an event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A field holds a value the wire format cannot carry.
    #[error("The {field} field {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// The queue message could not be turned back into an event.
    #[error("Invalid event: {reason}")]
    InvalidEvent {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The message was produced for a different CloudEvents version.
    #[error("Spec Version mismatch, expected {expected} got {}", .received.as_deref().unwrap_or("none"))]
    VersionMismatch {
        expected: &'static str,
        received: Option<String>,
    },

    /// The structured form could not be encoded to JSON.
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_event(reason: impl Into<String>) -> Self {
        Error::InvalidEvent {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_event_from(reason: impl Into<String>, source: serde_json::Error) -> Self {
        Error::InvalidEvent {
            reason: reason.into(),
            source: Some(source),
        }
    }
}
