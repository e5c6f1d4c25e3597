use agentdesk_chat::observability::init_observability;
use agentdesk_chat::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StreamError> {
    init_observability("info");
    let api_key = std::env::var("AGENTDESK_API_KEY").unwrap_or_default();
    let client = StreamingChatClient::from_env()?;
    let request = ChatStreamRequest::new("support-bot", "Say hello in five words.");

    let mut handlers = StreamHandlers::new()
        .on_start(|payload| eprintln!("started: {payload}"))
        .on_token(|payload| {
            if let Some(token) = payload.get("token").and_then(|v| v.as_str()) {
                print!("{token}");
            }
        })
        .on_done(|payload| println!("\n[done] {payload}"))
        .on_error(|payload| eprintln!("\n[error] {payload}"));

    client.stream(&request, &api_key, &mut handlers, None).await
}
