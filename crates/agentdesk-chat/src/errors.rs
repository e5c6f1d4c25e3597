/// Error returned by a `ChatTransport` when the connection or a body read
/// fails at the network level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// Top-level error type for chat calls.
///
/// Only failures of the exchange itself surface here. A malformed payload
/// inside an otherwise healthy stream is passed through as `{"raw": ...}`
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Invalid request input, rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Server answered with a non-success status before streaming began.
    #[error("chat request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
    /// The transport cannot deliver the body incrementally.
    #[error("streaming not supported by transport")]
    StreamingUnsupported,
    /// Connection, DNS, TLS or mid-stream read failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The caller aborted the call.
    #[error("stream cancelled")]
    Cancelled,
    /// A non-streaming reply could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl StreamError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status for `RequestFailed`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the call ended because the caller aborted it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Breach of the start/token/terminal ordering observed by a `StreamSession`.
///
/// The client never enforces ordering; sessions only record these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("start event received after token events")]
    StartAfterToken,
    #[error("more than one start event received")]
    DuplicateStart,
    #[error("{event} event received after the terminal event")]
    EventAfterTerminal { event: String },
    #[error("stream ended without a terminal event")]
    MissingTerminal,
}
