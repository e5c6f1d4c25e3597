use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

pub const OBSERVABILITY_ENV: &str = "AGENTDESK_OBSERVABILITY";
pub const LOG_LEVEL_ENV: &str = "AGENTDESK_LOG_LEVEL";
pub const JSON_LOG_PATH_ENV: &str = "AGENTDESK_JSON_LOG_PATH";

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    std::env::var(OBSERVABILITY_ENV)
        .ok()
        .map(|value| parse_bool_env(&value).unwrap_or(true))
        .unwrap_or(true)
}

fn resolve_env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV)
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Installs the global `tracing` subscriber; later calls are no-ops.
///
/// The filter comes from `AGENTDESK_LOG_LEVEL`, then `RUST_LOG`, then
/// `default_level`. `AGENTDESK_JSON_LOG_PATH` sends JSONL to that file;
/// otherwise a compact console layer writes to stderr, keeping stdout free
/// for streamed tokens. `AGENTDESK_OBSERVABILITY=off` installs nothing.
pub fn init_observability(default_level: &str) {
    INIT.get_or_init(|| {
        if !observability_enabled() {
            return;
        }

        let env_filter = resolve_env_filter(default_level);
        if let Ok(path_raw) = std::env::var(JSON_LOG_PATH_ENV) {
            let path = std::path::PathBuf::from(path_raw);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let _ = std::fs::create_dir_all(parent);
            }
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("agentdesk.logs.jsonl");
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}
