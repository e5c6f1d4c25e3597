use serde_json::Value;
use tracing::warn;

use crate::errors::ProtocolViolation;
use crate::event::EventKind;
use crate::handler::StreamHandler;

/// Lifecycle of a `StreamSession`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Created, no terminal event yet.
    #[default]
    Streaming,
    /// A `done` event arrived.
    Done,
    /// An `error` event arrived.
    Failed,
}

/// Caller-side accumulator for one streamed assistant reply.
///
/// Collects token text, learns the session id from `start`, and records any
/// departure from the start/token/terminal ordering. Nothing here is
/// persisted; history is the server's job.
#[derive(Clone, Debug, Default)]
pub struct StreamSession {
    session_id: Option<String>,
    start: Option<Value>,
    text: String,
    usage: Option<Value>,
    error: Option<String>,
    status: SessionStatus,
    tokens: usize,
    violations: Vec<ProtocolViolation>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session id announced by the `start` event.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Full `start` payload (version and model fields).
    pub fn start_payload(&self) -> Option<&Value> {
        self.start.as_ref()
    }

    /// Assistant text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `done` payload.
    pub fn usage(&self) -> Option<&Value> {
        self.usage.as_ref()
    }

    /// `tokens_used` from the `done` payload.
    pub fn tokens_used(&self) -> Option<u64> {
        self.usage
            .as_ref()
            .and_then(|u| u.get("tokens_used"))
            .and_then(Value::as_u64)
    }

    /// Detail of the `error` event.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Streaming
    }

    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    /// Closes the session after the stream call returned.
    ///
    /// Records `MissingTerminal` when no `done`/`error` event was seen.
    pub fn finish(&mut self) -> SessionStatus {
        if !self.is_finished() && !self.violations.contains(&ProtocolViolation::MissingTerminal) {
            self.record(ProtocolViolation::MissingTerminal);
        }
        self.status
    }

    /// Records ordering violations; returns `false` when the event arrived
    /// after the terminal event and must not change the session.
    fn accept(&mut self, kind: &EventKind) -> bool {
        if self.is_finished() {
            self.record(ProtocolViolation::EventAfterTerminal {
                event: kind.to_string(),
            });
            return false;
        }
        if *kind == EventKind::Start {
            if self.start.is_some() {
                self.record(ProtocolViolation::DuplicateStart);
            } else if self.tokens > 0 {
                self.record(ProtocolViolation::StartAfterToken);
            }
        }
        true
    }

    fn record(&mut self, violation: ProtocolViolation) {
        warn!(session_id = ?self.session_id, %violation, "chat stream protocol violation");
        self.violations.push(violation);
    }
}

impl StreamHandler for StreamSession {
    fn on_start(&mut self, payload: Value) {
        if !self.accept(&EventKind::Start) {
            return;
        }
        if let Some(id) = payload.get("session_id").and_then(Value::as_str) {
            self.session_id = Some(id.to_string());
        }
        self.start = Some(payload);
    }

    fn on_token(&mut self, payload: Value) {
        if !self.accept(&EventKind::Token) {
            return;
        }
        self.tokens += 1;
        if let Some(fragment) = payload.get("token").and_then(Value::as_str) {
            self.text.push_str(fragment);
        }
    }

    fn on_done(&mut self, payload: Value) {
        if !self.accept(&EventKind::Done) {
            return;
        }
        self.usage = Some(payload);
        self.status = SessionStatus::Done;
    }

    fn on_error(&mut self, payload: Value) {
        if !self.accept(&EventKind::Error) {
            return;
        }
        self.error = Some(error_detail(&payload));
        self.status = SessionStatus::Failed;
    }
}

fn error_detail(payload: &Value) -> String {
    ["detail", "message", "raw"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| payload.to_string())
}
