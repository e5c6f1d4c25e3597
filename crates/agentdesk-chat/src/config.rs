use std::time::Duration;

use crate::errors::StreamError;

pub const BASE_URL_ENV: &str = "AGENTDESK_API_BASE_URL";
pub const CONNECT_TIMEOUT_ENV: &str = "AGENTDESK_CONNECT_TIMEOUT_SECS";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Configuration for the chat client.
///
/// No whole-request timeout is applied: a stream lives until the server
/// closes it or the caller aborts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the dashboard API, e.g. `https://host/api`.
    pub base_url: String,
    /// Path of the SSE chat endpoint relative to `base_url`.
    pub stream_path: String,
    /// Path of the non-streaming chat endpoint relative to `base_url`.
    pub chat_path: String,
    /// Optional bound on establishing the TCP/TLS connection.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a config for `base_url` with default endpoint paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stream_path: "/chat/stream".to_string(),
            chat_path: "/chat".to_string(),
            connect_timeout: None,
        }
    }

    /// Builds a config from `AGENTDESK_API_BASE_URL` and
    /// `AGENTDESK_CONNECT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StreamError> {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url.trim());
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                StreamError::Config(format!(
                    "{CONNECT_TIMEOUT_ENV} must be whole seconds, got {raw:?}"
                ))
            })?;
            config.connect_timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Overrides the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the streaming endpoint path.
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Overrides the non-streaming endpoint path.
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StreamError> {
        if self.base_url.trim().is_empty() {
            return Err(StreamError::Config("base_url must not be empty".into()));
        }
        Ok(())
    }

    pub(crate) fn stream_url(&self) -> String {
        join_url(&self.base_url, &self.stream_path)
    }

    pub(crate) fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
