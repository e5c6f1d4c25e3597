//! Streaming chat client for agentdesk agents.
//!
//! Sends a message to an agent's chat endpoint, decodes the Server-Sent
//! Events response as it arrives, and hands `start`/`token`/`done`/`error`
//! payloads to a `StreamHandler`.
//!
//! # Streaming a reply
//!
//! ```no_run
//! use agentdesk_chat::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StreamError> {
//! let client = StreamingChatClient::from_env()?;
//! let request = ChatStreamRequest::new("support-bot", "Where is my order?")
//!     .variable("customer", "Ada");
//!
//! let mut session = StreamSession::new();
//! client
//!     .stream(&request, "pk_live_...", &mut session, None)
//!     .await?;
//!
//! println!("{}", session.text());
//! # Ok(())
//! # }
//! ```

/// Abort handle and cancel signal for in-flight streams.
pub mod cancel;
/// The chat client and its read loop.
pub mod client;
/// Endpoint and connection configuration.
pub mod config;
/// Public error types.
pub mod errors;
/// Decoded SSE events and their classification.
pub mod event;
/// Handler trait and event dispatch.
pub mod handler;
/// Process-wide logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Request and response bodies.
pub mod request;
/// Caller-side reply accumulator.
pub mod session;
/// Incremental SSE frame decoding.
pub mod sse;
/// HTTP transport seam and the `reqwest` implementation.
pub mod transport;

pub use cancel::{AbortHandle, CancelSignal, cancel_pair};
pub use client::StreamingChatClient;
pub use config::ClientConfig;
pub use errors::{ProtocolViolation, StreamError, TransportError};
pub use event::{EventKind, SseEvent};
pub use handler::{StreamHandler, StreamHandlers};
pub use request::{ChatResponse, ChatStreamRequest};
pub use session::{SessionStatus, StreamSession};
pub use transport::{ChatTransport, ReqwestTransport};
