use std::pin::Pin;

use futures::StreamExt as _;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{StreamError, TransportError};

/// Incremental response body.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, TransportError>> + Send + 'static>>;

/// One outgoing chat request as seen by a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`, replacing any other auth.
    pub bearer_token: String,
    /// JSON request body.
    pub body: serde_json::Value,
    /// True when the caller expects an event stream back.
    pub event_stream: bool,
}

/// Response body as delivered by a transport.
pub enum ResponseBody {
    /// Body chunks are delivered as they arrive.
    Streaming(ByteStream),
    /// The transport only exposes the complete body.
    Buffered(bytes::Bytes),
}

impl ResponseBody {
    /// Reads the whole body into memory.
    pub async fn collect(self) -> Result<bytes::Bytes, TransportError> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Streaming(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(bytes::Bytes::from(buf))
            }
        }
    }

    /// Reads the whole body as lossy UTF-8 text.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.collect().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Status and body returned by `ChatTransport::open`.
pub struct TransportResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opens HTTP requests and hands back the response body.
///
/// Dropping the future returned by `open`, or the `ByteStream` in its
/// response, aborts the underlying request.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(&self, request: HttpRequest) -> Result<TransportResponse, TransportError>;
}

/// `ChatTransport` backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client honouring `config.connect_timeout` and nothing else
    /// time-related.
    pub fn new(config: &ClientConfig) -> Result<Self, StreamError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StreamError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client, sharing its connection pool.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ChatTransport for ReqwestTransport {
    async fn open(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
        debug!(url = %request.url, event_stream = request.event_stream, "opening chat request");
        let mut http_req = self
            .client
            .post(&request.url)
            .bearer_auth(&request.bearer_token)
            .json(&request.body);
        if request.event_stream {
            http_req = http_req.header(reqwest::header::ACCEPT, "text/event-stream");
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| TransportError::new(format!("chat request failed: {e}")))?;
        let status = response.status().as_u16();
        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| TransportError::new(format!("chat stream read failed: {e}")))
        });
        Ok(TransportResponse {
            status,
            body: ResponseBody::Streaming(Box::pin(stream)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn streaming_body_collects_all_chunks() {
        let chunks: Vec<Result<bytes::Bytes, TransportError>> = vec![
            Ok(bytes::Bytes::from_static(b"Agent ")),
            Ok(bytes::Bytes::from_static(b"not found")),
        ];
        let body = ResponseBody::Streaming(Box::pin(stream::iter(chunks)));
        assert_eq!(body.text().await.expect("text"), "Agent not found");
    }

    #[tokio::test]
    async fn streaming_body_surfaces_read_errors() {
        let chunks: Vec<Result<bytes::Bytes, TransportError>> = vec![
            Ok(bytes::Bytes::from_static(b"partial")),
            Err(TransportError::new("connection reset")),
        ];
        let body = ResponseBody::Streaming(Box::pin(stream::iter(chunks)));
        let err = body.collect().await.expect_err("read error");
        assert_eq!(err.message(), "connection reset");
    }

    #[test]
    fn success_range_is_2xx() {
        let response = |status| TransportResponse {
            status,
            body: ResponseBody::Buffered(bytes::Bytes::new()),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn reqwest_transport_builds_from_config() {
        let config = ClientConfig::default().connect_timeout(std::time::Duration::from_secs(3));
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    mod over_http {
        use super::*;
        use serde_json::json;
        use wiremock::matchers::{body_json, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const EVENTS: &str = "event: start\ndata: {\"session_id\":\"abc\"}\n\n\
event: token\ndata: {\"token\":\"Hi\"}\n\n\
event: done\ndata: {\"tokens_used\":1}\n\n";

        fn transport() -> ReqwestTransport {
            ReqwestTransport::new(&ClientConfig::default()).expect("transport")
        }

        fn stream_request(server: &MockServer, token: &str) -> HttpRequest {
            HttpRequest {
                url: format!("{}/api/chat/stream", server.uri()),
                bearer_token: token.to_string(),
                body: json!({"message": "hello", "agent_name": "support-bot"}),
                event_stream: true,
            }
        }

        #[tokio::test]
        async fn stream_request_sends_auth_json_and_accept_headers() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/chat/stream"))
                .and(header("authorization", "Bearer pk_1"))
                .and(header("content-type", "application/json"))
                .and(header("accept", "text/event-stream"))
                .and(body_json(
                    json!({"message": "hello", "agent_name": "support-bot"}),
                ))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/event-stream")
                        .set_body_string(EVENTS),
                )
                .expect(1)
                .mount(&server)
                .await;

            let response = transport()
                .open(stream_request(&server, "pk_1"))
                .await
                .expect("open");
            assert_eq!(response.status, 200);
            assert!(matches!(response.body, ResponseBody::Streaming(_)));
            assert_eq!(response.body.text().await.expect("body"), EVENTS);
        }

        #[tokio::test]
        async fn non_success_body_is_passed_through() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/chat/stream"))
                .respond_with(ResponseTemplate::new(401).set_body_string("bad api key!"))
                .mount(&server)
                .await;

            let response = transport()
                .open(stream_request(&server, "wrong"))
                .await
                .expect("open");
            assert_eq!(response.status, 401);
            assert!(!response.is_success());
            assert_eq!(response.body.text().await.expect("body"), "bad api key!");
        }
    }
}
