use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reviewdesk_core::config::{AppConfig, CONFIG_SEARCH_PATHS};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    match load_config("config") {
        Ok(config) => CommandResult { exit_code: 0, output: render(&config) },
        Err(failure) => failure,
    }
}

/// One line per setting with its value (secrets redacted) and where it came
/// from.
pub fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let review_hours = config
        .scheduling
        .default_review_hours
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let entries: [(&str, &str, String); 12] = [
        ("database.url", "REVIEWDESK_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "REVIEWDESK_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "REVIEWDESK_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        (
            "slack.app_token",
            "REVIEWDESK_SLACK_APP_TOKEN",
            redact_token(config.slack.app_token.expose_secret()),
        ),
        (
            "slack.bot_token",
            "REVIEWDESK_SLACK_BOT_TOKEN",
            redact_token(config.slack.bot_token.expose_secret()),
        ),
        (
            "server.bind_address",
            "REVIEWDESK_SERVER_BIND_ADDRESS",
            config.server.bind_address.clone(),
        ),
        (
            "server.health_check_port",
            "REVIEWDESK_SERVER_HEALTH_CHECK_PORT",
            config.server.health_check_port.to_string(),
        ),
        (
            "server.graceful_shutdown_secs",
            "REVIEWDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "scheduling.action_secret",
            "REVIEWDESK_SCHEDULING_ACTION_SECRET",
            redact_secret(config.scheduling.action_secret.expose_secret()),
        ),
        (
            "scheduling.default_review_hours",
            "REVIEWDESK_SCHEDULING_DEFAULT_REVIEW_HOURS",
            review_hours,
        ),
        ("logging.level", "REVIEWDESK_LOGGING_LEVEL", config.logging.level.clone()),
        (
            "logging.format",
            "REVIEWDESK_LOGGING_FORMAT",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|(key, env_key, value)| {
        render_line(
            key,
            value,
            field_source(
                key,
                Some(*env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        )
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: &str) -> String {
    let redacted = if secret.trim().is_empty() { "<unset>" } else { "<redacted>" };
    redacted.to_string()
}
