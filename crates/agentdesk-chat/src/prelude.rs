//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, CancelSignal, ChatResponse, ChatStreamRequest, ClientConfig, SessionStatus,
    StreamError, StreamHandler, StreamHandlers, StreamSession, StreamingChatClient, cancel_pair,
};
