use std::future::Future;
use std::sync::Arc;

use futures::StreamExt as _;
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::config::ClientConfig;
use crate::errors::StreamError;
use crate::handler::{StreamHandler, dispatch};
use crate::request::{ChatResponse, ChatStreamRequest};
use crate::sse::SseDecoder;
use crate::transport::{ChatTransport, HttpRequest, ReqwestTransport, ResponseBody};

/// Client for an agent's chat endpoints.
///
/// Holds no per-call state: every `stream` call owns its own decode buffer,
/// so one client can drive any number of concurrent streams.
#[derive(Clone)]
pub struct StreamingChatClient {
    transport: Arc<dyn ChatTransport>,
    config: ClientConfig,
}

impl StreamingChatClient {
    /// Creates a client using the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config,
        })
    }

    /// Creates a client from `AGENTDESK_*` environment variables.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request` to the streaming endpoint and dispatches each decoded
    /// event to `handler` as it arrives.
    ///
    /// Resolves `Ok(())` when the server closes the stream. Bytes of an
    /// unterminated final frame are discarded, so completion should be read
    /// from the `done`/`error` event rather than from this returning.
    ///
    /// Once `cancel` fires the call returns `StreamError::Cancelled` and no
    /// further handler calls are made.
    pub async fn stream<H: StreamHandler + ?Sized>(
        &self,
        request: &ChatStreamRequest,
        bearer_token: &str,
        handler: &mut H,
        mut cancel: Option<CancelSignal>,
    ) -> Result<(), StreamError> {
        let http_request = prepare(request, bearer_token, self.config.stream_url(), true)?;
        if is_cancelled(&cancel) {
            return Err(StreamError::Cancelled);
        }
        debug!(
            url = %http_request.url,
            agent = %request.agent_name,
            version = ?request.version_number,
            session_id = ?request.session_id,
            "starting chat stream"
        );

        let response = until_cancelled(&mut cancel, self.transport.open(http_request)).await??;
        let status = response.status;
        if !response.is_success() {
            let body = until_cancelled(&mut cancel, response.body.text()).await??;
            return Err(StreamError::RequestFailed { status, body });
        }
        let ResponseBody::Streaming(mut body) = response.body else {
            return Err(StreamError::StreamingUnsupported);
        };

        let mut decoder = SseDecoder::default();
        let mut dispatched = 0_u64;
        let mut saw_terminal = false;
        loop {
            match until_cancelled(&mut cancel, body.next()).await? {
                Some(Ok(chunk)) => {
                    for event in decoder.push_chunk(&chunk) {
                        if is_cancelled(&cancel) {
                            return Err(StreamError::Cancelled);
                        }
                        let terminal = event.kind().is_terminal();
                        if dispatch(&mut *handler, event) {
                            dispatched += 1;
                            saw_terminal |= terminal;
                        }
                    }
                }
                Some(Err(e)) => return Err(StreamError::Transport(e)),
                None => break,
            }
        }

        if decoder.pending_len() > 0 {
            debug!(
                bytes = decoder.pending_len(),
                "discarding unterminated trailing frame"
            );
        }
        debug!(dispatched, saw_terminal, "chat stream closed by server");
        Ok(())
    }

    /// Sends `request` to the non-streaming endpoint and returns the full
    /// reply.
    pub async fn send(
        &self,
        request: &ChatStreamRequest,
        bearer_token: &str,
    ) -> Result<ChatResponse, StreamError> {
        let http_request = prepare(request, bearer_token, self.config.chat_url(), false)?;
        debug!(url = %http_request.url, agent = %request.agent_name, "sending chat message");

        let response = self.transport.open(http_request).await?;
        let status = response.status;
        let success = response.is_success();
        let body = response.body.collect().await?;
        if !success {
            return Err(StreamError::RequestFailed {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body)
            .map_err(|e| StreamError::Decode(format!("invalid chat response: {e}")))
    }
}

fn prepare(
    request: &ChatStreamRequest,
    bearer_token: &str,
    url: String,
    event_stream: bool,
) -> Result<HttpRequest, StreamError> {
    request.validate()?;
    if bearer_token.trim().is_empty() {
        return Err(StreamError::validation("bearer token must not be empty"));
    }
    let body = serde_json::to_value(request)
        .map_err(|e| StreamError::validation(format!("failed to encode request: {e}")))?;
    Ok(HttpRequest {
        url,
        bearer_token: bearer_token.to_string(),
        body,
        event_stream,
    })
}

fn is_cancelled(cancel: &Option<CancelSignal>) -> bool {
    cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
}

/// Drives `fut` to completion unless `cancel` fires first, in which case
/// `fut` is dropped.
async fn until_cancelled<F: Future>(
    cancel: &mut Option<CancelSignal>,
    fut: F,
) -> Result<F::Output, StreamError> {
    match cancel {
        Some(signal) => tokio::select! {
            biased;
            _ = signal.cancelled() => Err(StreamError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}
