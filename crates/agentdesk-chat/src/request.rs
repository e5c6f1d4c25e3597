use std::collections::BTreeMap;

use crate::errors::StreamError;

/// Body sent to the chat endpoints.
///
/// Optional fields are forwarded verbatim and omitted from the JSON body when
/// unset, so the server falls back to the agent's active version and a fresh
/// session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatStreamRequest {
    /// User message for this turn.
    pub message: String,
    /// Agent name, matched case-insensitively by the server.
    pub agent_name: String,
    /// Pinned agent version. `None` uses the active version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<i64>,
    /// Existing conversation to continue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<uuid::Uuid>,
    /// Values substituted into the system prompt's `{variables}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, String>>,
}

impl ChatStreamRequest {
    /// Creates a request for `agent_name` with no optional fields set.
    pub fn new(agent_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent_name: agent_name.into(),
            version_number: None,
            session_id: None,
            variables: None,
        }
    }

    /// Pins the agent version.
    pub fn version_number(mut self, version: i64) -> Self {
        self.version_number = Some(version);
        self
    }

    /// Continues an existing session.
    pub fn session_id(mut self, session_id: uuid::Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Adds one prompt variable.
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StreamError> {
        if self.message.trim().is_empty() {
            return Err(StreamError::validation("message must not be empty"));
        }
        if self.agent_name.trim().is_empty() {
            return Err(StreamError::validation("agent_name must not be empty"));
        }
        Ok(())
    }
}

/// Reply of the non-streaming chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: uuid::Uuid,
    pub agent_name: String,
    pub version_number: i64,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    /// Session-wide totals.
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub total_prompt_tokens: Option<u64>,
    #[serde(default)]
    pub total_completion_tokens: Option<u64>,
}
