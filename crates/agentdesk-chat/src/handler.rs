use serde_json::Value;

use crate::event::{EventKind, SseEvent};

/// Receives dispatched stream events.
///
/// Every method defaults to a no-op, so implementors only override the
/// events they care about. Calls happen synchronously inside the read loop;
/// a handler that blocks stalls the stream.
pub trait StreamHandler {
    /// `start` payload (session, version and model fields).
    fn on_start(&mut self, _payload: Value) {}
    /// `token` payload (one incremental text fragment).
    fn on_token(&mut self, _payload: Value) {}
    /// `done` payload (usage accounting).
    fn on_done(&mut self, _payload: Value) {}
    /// `error` payload (human-readable detail).
    fn on_error(&mut self, _payload: Value) {}
}

impl<H: StreamHandler + ?Sized> StreamHandler for &mut H {
    fn on_start(&mut self, payload: Value) {
        (**self).on_start(payload)
    }

    fn on_token(&mut self, payload: Value) {
        (**self).on_token(payload)
    }

    fn on_done(&mut self, payload: Value) {
        (**self).on_done(payload)
    }

    fn on_error(&mut self, payload: Value) {
        (**self).on_error(payload)
    }
}

type Callback<'a> = Box<dyn FnMut(Value) + Send + 'a>;

/// Closure-backed `StreamHandler`; unset callbacks are skipped.
///
/// Each callback is boxed on its own, so two callbacks cannot both hold
/// `&mut` to the same accumulator. Implement `StreamHandler` on a struct
/// when several events feed shared state (see `StreamSession`).
#[derive(Default)]
pub struct StreamHandlers<'a> {
    on_start: Option<Callback<'a>>,
    on_token: Option<Callback<'a>>,
    on_done: Option<Callback<'a>>,
    on_error: Option<Callback<'a>>,
}

impl<'a> StreamHandlers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnMut(Value) + Send + 'a) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_token(mut self, f: impl FnMut(Value) + Send + 'a) -> Self {
        self.on_token = Some(Box::new(f));
        self
    }

    pub fn on_done(mut self, f: impl FnMut(Value) + Send + 'a) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(Value) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl StreamHandler for StreamHandlers<'_> {
    fn on_start(&mut self, payload: Value) {
        if let Some(f) = self.on_start.as_mut() {
            f(payload);
        }
    }

    fn on_token(&mut self, payload: Value) {
        if let Some(f) = self.on_token.as_mut() {
            f(payload);
        }
    }

    fn on_done(&mut self, payload: Value) {
        if let Some(f) = self.on_done.as_mut() {
            f(payload);
        }
    }

    fn on_error(&mut self, payload: Value) {
        if let Some(f) = self.on_error.as_mut() {
            f(payload);
        }
    }
}

/// Routes `event` to the matching handler method.
///
/// Returns `false` for unrecognised event names, which are not dispatched.
pub fn dispatch<H: StreamHandler + ?Sized>(handler: &mut H, event: SseEvent) -> bool {
    match event.kind() {
        EventKind::Start => handler.on_start(event.data),
        EventKind::Token => handler.on_token(event.data),
        EventKind::Done => handler.on_done(event.data),
        EventKind::Error => handler.on_error(event.data),
        EventKind::Other(name) => {
            tracing::trace!(event = %name, "ignoring unrecognised stream event");
            return false;
        }
    }
    true
}
