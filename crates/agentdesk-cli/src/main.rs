//! Terminal chat playground: streams one message to an agent and prints the
//! reply as it arrives.

mod cli;

use std::error::Error;
use std::io::Write;

use agentdesk_chat::observability::init_observability;
use agentdesk_chat::prelude::*;
use clap::Parser as _;
use serde_json::Value;

use crate::cli::Cli;

/// Prints token fragments as they arrive while feeding the session.
struct TokenPrinter<W: Write> {
    session: StreamSession,
    out: W,
}

impl<W: Write> TokenPrinter<W> {
    fn new(out: W) -> Self {
        Self {
            session: StreamSession::new(),
            out,
        }
    }
}

impl<W: Write> StreamHandler for TokenPrinter<W> {
    fn on_start(&mut self, payload: Value) {
        self.session.on_start(payload);
    }

    fn on_token(&mut self, payload: Value) {
        if let Some(fragment) = payload.get("token").and_then(Value::as_str) {
            let _ = write!(self.out, "{fragment}");
            let _ = self.out.flush();
        }
        self.session.on_token(payload);
    }

    fn on_done(&mut self, payload: Value) {
        let _ = writeln!(self.out);
        self.session.on_done(payload);
    }

    fn on_error(&mut self, payload: Value) {
        self.session.on_error(payload);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_observability(if args.verbose { "debug" } else { "warn" });

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = args.base_url.as_deref() {
        config = config.base_url(base_url);
    }
    let client = StreamingChatClient::new(config)?;
    let request = args.chat_request();

    if args.no_stream {
        let reply = client.send(&request, &args.api_key).await?;
        println!("{}", reply.response);
        eprintln!(
            "session {} (agent {} v{}, tokens used: {})",
            reply.session_id,
            reply.agent_name,
            reply.version_number,
            reply
                .tokens_used
                .map_or_else(|| "n/a".to_string(), |t| t.to_string())
        );
        return Ok(());
    }

    let (abort, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    let mut printer = TokenPrinter::new(std::io::stdout());
    client
        .stream(&request, &args.api_key, &mut printer, Some(signal))
        .await?;

    let session = &mut printer.session;
    let status = session.finish();
    tracing::debug!(?status, violations = session.violations().len(), "chat stream finished");
    match status {
        SessionStatus::Done => {
            eprintln!(
                "session {} (tokens used: {})",
                session.session_id().unwrap_or("unknown"),
                session
                    .tokens_used()
                    .map_or_else(|| "n/a".to_string(), |t| t.to_string())
            );
            Ok(())
        }
        SessionStatus::Failed => Err(format!(
            "agent error: {}",
            session.error().unwrap_or("unknown error")
        )
        .into()),
        SessionStatus::Streaming => {
            Err("stream closed before the agent finished replying".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn printer_echoes_tokens_and_tracks_session() {
        let mut printer = TokenPrinter::new(Vec::new());
        printer.on_start(json!({"session_id": "abc"}));
        printer.on_token(json!({"token": "Hi"}));
        printer.on_token(json!({"token": " there"}));
        printer.on_done(json!({"tokens_used": 5}));

        assert_eq!(String::from_utf8(printer.out).expect("utf8"), "Hi there\n");
        assert_eq!(printer.session.text(), "Hi there");
        assert_eq!(printer.session.session_id(), Some("abc"));
        assert_eq!(printer.session.finish(), SessionStatus::Done);
    }

    #[test]
    fn printer_records_agent_error() {
        let mut printer = TokenPrinter::new(Vec::new());
        printer.on_error(json!({"detail": "No active version found for this agent"}));
        assert_eq!(printer.session.finish(), SessionStatus::Failed);
        assert!(printer.out.is_empty());
    }
}
