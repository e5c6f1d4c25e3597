use agentdesk_chat::ChatStreamRequest;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agentdesk")]
#[command(version, about = "Chat with an agentdesk agent from the terminal")]
pub struct Cli {
    /// Message to send
    pub message: String,

    /// Agent name (matched case-insensitively by the server)
    #[arg(short, long)]
    pub agent: String,

    /// Project API key sent as the bearer token
    #[arg(long, env = "AGENTDESK_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// API base URL (defaults to AGENTDESK_API_BASE_URL or http://localhost:8000/api)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Pin an agent version instead of the active one
    #[arg(long = "version-number", value_name = "N")]
    pub version_number: Option<i64>,

    /// Continue an existing session
    #[arg(long)]
    pub session_id: Option<uuid::Uuid>,

    /// Prompt variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Use the non-streaming endpoint
    #[arg(long)]
    pub no_stream: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn chat_request(&self) -> ChatStreamRequest {
        let mut request = ChatStreamRequest::new(&self.agent, &self.message);
        if let Some(version) = self.version_number {
            request = request.version_number(version);
        }
        if let Some(session_id) = self.session_id {
            request = request.session_id(session_id);
        }
        for (key, value) in &self.vars {
            request = request.variable(key, value);
        }
        request
    }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("variable name missing in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_splits_on_first_equals() {
        assert_eq!(
            parse_var("query=a=b").expect("var"),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn args_build_chat_request() {
        let cli = Cli::try_parse_from([
            "agentdesk",
            "--agent",
            "support-bot",
            "--api-key",
            "pk_test",
            "--version-number",
            "3",
            "--session-id",
            "8c5ab6b2-8a39-4cf4-9f0b-3f8f1f6a2b10",
            "--var",
            "customer=Ada",
            "--var",
            "tone=formal",
            "Where is my order?",
        ])
        .expect("parse");
        let request = cli.chat_request();
        assert_eq!(request.message, "Where is my order?");
        assert_eq!(request.agent_name, "support-bot");
        assert_eq!(request.version_number, Some(3));
        assert_eq!(
            request.session_id.map(|s| s.to_string()).as_deref(),
            Some("8c5ab6b2-8a39-4cf4-9f0b-3f8f1f6a2b10")
        );
        let vars = request.variables.expect("vars");
        assert_eq!(vars.get("customer").map(String::as_str), Some("Ada"));
        assert_eq!(vars.get("tone").map(String::as_str), Some("formal"));
        assert!(!cli.no_stream);
    }

    #[test]
    fn invalid_session_id_is_rejected() {
        let result = Cli::try_parse_from([
            "agentdesk",
            "--agent",
            "bot",
            "--api-key",
            "k",
            "--session-id",
            "not-a-uuid",
            "hi",
        ]);
        assert!(result.is_err());
    }
}
