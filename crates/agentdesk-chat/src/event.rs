use std::fmt;

/// Event name used when a frame carries no `event:` line.
pub const DEFAULT_EVENT_NAME: &str = "message";

/// Application-level meaning of an SSE event name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Session, version and model identification. At most one per stream.
    Start,
    /// One incremental text fragment.
    Token,
    /// Terminal success with usage accounting.
    Done,
    /// Terminal failure with a human-readable detail.
    Error,
    /// Any other name; parsed but never dispatched.
    Other(String),
}

impl EventKind {
    /// Classifies an event name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "start" => Self::Start,
            "token" => Self::Token,
            "done" => Self::Done,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// True for `done` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Token => f.write_str("token"),
            Self::Done => f.write_str("done"),
            Self::Error => f.write_str("error"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One decoded SSE frame.
///
/// Built per frame, handed to dispatch, then dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct SseEvent {
    /// Event name, `"message"` when the frame had no `event:` line.
    pub event: String,
    /// Parsed JSON payload, or `{"raw": <data>}` when the data was not JSON.
    pub data: serde_json::Value,
}

impl SseEvent {
    /// Classifies this event's name.
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }
}
