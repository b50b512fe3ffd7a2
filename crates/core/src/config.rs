//! Settings are layered: built-in defaults, then the TOML file, then
//! `REVIEWDESK_*` environment variables, then [`ConfigOverrides`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::MIN_SECRET_LEN;
use crate::domain::slot::{normalize_review_hours, DEFAULT_REVIEW_HOURS};

/// Checked in order when no explicit path is given.
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["reviewdesk.toml", "config/reviewdesk.toml"];

const ENV_PREFIX: &str = "REVIEWDESK";

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub scheduling: SchedulingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    /// App-level token used to open the Socket Mode connection.
    pub app_token: SecretString,
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SchedulingConfig {
    /// Key that signs schedule button tokens. Rotating it invalidates every
    /// button already posted.
    pub action_secret: SecretString,
    pub default_review_hours: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values supplied by the caller; they win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub slack_app_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub action_secret: Option<String>,
    pub default_review_hours: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    Toml { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    FileNotFound(PathBuf),
    #[error("placeholder `${{{0}}}` names an unset environment variable")]
    UnsetVariable(String),
    #[error("a `${{` placeholder is never closed")]
    UnclosedPlaceholder,
    #[error("{key}={value:?} cannot be parsed")]
    BadEnvValue { key: String, value: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://reviewdesk.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self { app_token: String::new().into(), bot_token: String::new().into() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            health_check_port: 8080,
            graceful_shutdown_secs: 15,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            action_secret: String::new().into(),
            default_review_hours: DEFAULT_REVIEW_HOURS.to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "log format `{other}` is not one of compact, pretty, json"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let LoadOptions { config_path, require_file, overrides } = options;
        let mut config = Self::default();

        match locate_file(config_path.as_deref()) {
            Some(path) => config.merge_file(FileLayer::read(&path)?),
            None if require_file => {
                let expected = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_SEARCH_PATHS[0]));
                return Err(ConfigError::FileNotFound(expected));
            }
            None => {}
        }
        config.merge_env()?;
        config.merge_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.slack.validate()?;
        self.server.validate()?;
        self.scheduling.validate()?;
        self.logging.validate()
    }

    fn merge_file(&mut self, file: FileLayer) {
        let FileLayer { database, slack, server, scheduling, logging } = file;

        replace(&mut self.database.url, database.url);
        replace(&mut self.database.max_connections, database.max_connections);
        replace(&mut self.database.timeout_secs, database.timeout_secs);

        replace_secret(&mut self.slack.app_token, slack.app_token);
        replace_secret(&mut self.slack.bot_token, slack.bot_token);

        replace(&mut self.server.bind_address, server.bind_address);
        replace(&mut self.server.health_check_port, server.health_check_port);
        replace(&mut self.server.graceful_shutdown_secs, server.graceful_shutdown_secs);

        replace_secret(&mut self.scheduling.action_secret, scheduling.action_secret);
        replace(&mut self.scheduling.default_review_hours, scheduling.default_review_hours);

        replace(&mut self.logging.level, logging.level);
        replace(&mut self.logging.format, logging.format);
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        replace(&mut self.database.url, env_value("DATABASE_URL")?);
        replace(&mut self.database.max_connections, env_value("DATABASE_MAX_CONNECTIONS")?);
        replace(&mut self.database.timeout_secs, env_value("DATABASE_TIMEOUT_SECS")?);

        replace_secret(&mut self.slack.app_token, env_value("SLACK_APP_TOKEN")?);
        replace_secret(&mut self.slack.bot_token, env_value("SLACK_BOT_TOKEN")?);

        replace(&mut self.server.bind_address, env_value("SERVER_BIND_ADDRESS")?);
        replace(&mut self.server.health_check_port, env_value("SERVER_HEALTH_CHECK_PORT")?);
        replace(
            &mut self.server.graceful_shutdown_secs,
            env_value("SERVER_GRACEFUL_SHUTDOWN_SECS")?,
        );

        replace_secret(&mut self.scheduling.action_secret, env_value("SCHEDULING_ACTION_SECRET")?);
        let hours = env_value::<HourList>("SCHEDULING_DEFAULT_REVIEW_HOURS")?;
        replace(&mut self.scheduling.default_review_hours, hours.map(|list| list.0));

        replace(&mut self.logging.level, first_env_value(&["LOGGING_LEVEL", "LOG_LEVEL"])?);
        replace(&mut self.logging.format, first_env_value(&["LOGGING_FORMAT", "LOG_FORMAT"])?);

        Ok(())
    }

    fn merge_overrides(&mut self, overrides: ConfigOverrides) {
        replace(&mut self.database.url, overrides.database_url);
        replace(&mut self.logging.level, overrides.log_level);
        replace_secret(&mut self.slack.app_token, overrides.slack_app_token);
        replace_secret(&mut self.slack.bot_token, overrides.slack_bot_token);
        replace_secret(&mut self.scheduling.action_secret, overrides.action_secret);
        replace(&mut self.scheduling.default_review_hours, overrides.default_review_hours);
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        require(
            url.starts_with("sqlite:") || url == ":memory:",
            "database.url must point at SQLite (`sqlite://path`, `sqlite::memory:` or `:memory:`)",
        )?;
        require(self.max_connections > 0, "database.max_connections cannot be zero")?;
        require(
            (1..=300).contains(&self.timeout_secs),
            "database.timeout_secs must be between 1 and 300",
        )
    }
}

impl SlackConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_token("slack.app_token", &self.app_token, "xapp-", ("xoxb-", "the bot token"))?;
        check_token("slack.bot_token", &self.bot_token, "xoxb-", ("xapp-", "the app token"))
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require(self.health_check_port != 0, "server.health_check_port cannot be zero")?;
        require(self.graceful_shutdown_secs != 0, "server.graceful_shutdown_secs cannot be zero")
    }
}

impl SchedulingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.action_secret.expose_secret().trim().len() >= MIN_SECRET_LEN,
            &format!("scheduling.action_secret needs at least {MIN_SECRET_LEN} bytes"),
        )?;
        let hours = normalize_review_hours(&self.default_review_hours).map_err(|error| {
            ConfigError::Invalid(format!("scheduling.default_review_hours: {error}"))
        })?;
        require(!hours.is_empty(), "scheduling.default_review_hours is empty")
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        require(
            matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error"),
            "logging.level must be trace, debug, info, warn or error",
        )
    }
}

fn require(holds: bool, message: &str) -> Result<(), ConfigError> {
    if holds {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

/// `swapped` is the prefix and name of the other Slack token, which is the
/// usual mistake.
fn check_token(
    field: &str,
    token: &SecretString,
    prefix: &str,
    swapped: (&str, &str),
) -> Result<(), ConfigError> {
    let token = token.expose_secret().trim();
    require(!token.is_empty(), &format!("{field} is not set"))?;
    if token.starts_with(prefix) {
        return Ok(());
    }

    let (other_prefix, other_name) = swapped;
    let hint = if token.starts_with(other_prefix) {
        format!("; the value looks like {other_name}")
    } else {
        String::new()
    };
    Err(ConfigError::Invalid(format!("{field} must begin with `{prefix}`{hint}")))
}

fn replace<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn replace_secret(target: &mut SecretString, value: Option<String>) {
    replace(target, value.map(SecretString::from));
}

fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

/// Reads `REVIEWDESK_<name>`. Unset and blank variables are both absent.
fn env_value<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    let key = format!("{ENV_PREFIX}_{name}");
    let Ok(raw) = env::var(&key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| ConfigError::BadEnvValue { key, value: raw })
}

fn first_env_value<T: FromStr>(names: &[&str]) -> Result<Option<T>, ConfigError> {
    for name in names {
        if let Some(value) = env_value(name)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Comma-separated hours, e.g. `9,10,14`.
struct HourList(Vec<u8>);

impl FromStr for HourList {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .split(',')
            .map(str::trim)
            .filter(|hour| !hour.is_empty())
            .map(str::parse::<u8>)
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

/// Replaces every `${NAME}` with the value of the environment variable.
fn expand_placeholders(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or(ConfigError::UnclosedPlaceholder)?;
        let name = &tail[..end];
        let value = env::var(name).map_err(|_| ConfigError::UnsetVariable(name.to_string()))?;
        expanded.push_str(&value);
        rest = &tail[end + 1..];
    }
    expanded.push_str(rest);

    Ok(expanded)
}

/// The TOML file. Every key is optional; absent keys keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLayer {
    database: DatabaseSection,
    slack: SlackSection,
    server: ServerSection,
    scheduling: SchedulingSection,
    logging: LoggingSection,
}

impl FileLayer {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&expand_placeholders(&raw)?)
            .map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseSection {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SlackSection {
    app_token: Option<String>,
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SchedulingSection {
    action_secret: Option<String>,
    default_review_hours: Option<Vec<u8>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingSection {
    level: Option<String>,
    format: Option<LogFormat>,
}
