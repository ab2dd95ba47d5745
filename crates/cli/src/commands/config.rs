use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use threadlink_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, CONFIG_EXIT_CODE};

struct ConfigField {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl ConfigField {
    fn new(key: &'static str, env_keys: &'static [&'static str], value: impl Into<String>) -> Self {
        Self { key, env_keys, value: value.into() }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                CONFIG_EXIT_CODE,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::output(0, lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let signing_secret =
        if config.slack.signing_secret.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        ConfigField::new(
            "slack.bot_token",
            &["THREADLINK_SLACK_BOT_TOKEN"],
            redact_token(config.slack.bot_token.expose_secret()),
        ),
        ConfigField::new(
            "slack.bot_user_id",
            &["THREADLINK_SLACK_BOT_USER_ID"],
            config.slack.bot_user_id.clone(),
        ),
        ConfigField::new(
            "slack.channel_id",
            &["THREADLINK_SLACK_CHANNEL_ID"],
            config.slack.channel_id.clone(),
        ),
        ConfigField::new(
            "slack.workspace_domain",
            &["THREADLINK_SLACK_WORKSPACE_DOMAIN"],
            config.slack.workspace_domain.clone(),
        ),
        ConfigField::new(
            "slack.api_base_url",
            &["THREADLINK_SLACK_API_BASE_URL"],
            config.slack.api_base_url.clone(),
        ),
        ConfigField::new("slack.signing_secret", &["THREADLINK_SLACK_SIGNING_SECRET"], signing_secret),
        ConfigField::new(
            "slack.signature_max_age_secs",
            &["THREADLINK_SLACK_SIGNATURE_MAX_AGE_SECS"],
            config.slack.signature_max_age_secs.to_string(),
        ),
        ConfigField::new(
            "slack.timeout_secs",
            &["THREADLINK_SLACK_TIMEOUT_SECS"],
            config.slack.timeout_secs.to_string(),
        ),
        ConfigField::new("jira.base_url", &["THREADLINK_JIRA_BASE_URL"], config.jira.base_url.clone()),
        ConfigField::new("jira.username", &["THREADLINK_JIRA_USERNAME"], config.jira.username.clone()),
        ConfigField::new("jira.api_token", &["THREADLINK_JIRA_API_TOKEN"], "<redacted>"),
        ConfigField::new(
            "jira.project_key",
            &["THREADLINK_JIRA_PROJECT_KEY"],
            config.jira.project_key.clone(),
        ),
        ConfigField::new(
            "jira.issue_type",
            &["THREADLINK_JIRA_ISSUE_TYPE"],
            config.jira.issue_type.clone(),
        ),
        ConfigField::new(
            "jira.timeout_secs",
            &["THREADLINK_JIRA_TIMEOUT_SECS"],
            config.jira.timeout_secs.to_string(),
        ),
        ConfigField::new(
            "notify.max_attempts",
            &["THREADLINK_NOTIFY_MAX_ATTEMPTS"],
            config.notify.max_attempts.to_string(),
        ),
        ConfigField::new(
            "notify.retry_delay_secs",
            &["THREADLINK_NOTIFY_RETRY_DELAY_SECS"],
            config.notify.retry_delay_secs.to_string(),
        ),
        ConfigField::new(
            "display.timezone",
            &["THREADLINK_DISPLAY_TIMEZONE"],
            config.display.timezone.name(),
        ),
        ConfigField::new(
            "server.bind_address",
            &["THREADLINK_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ConfigField::new("server.port", &["THREADLINK_SERVER_PORT"], config.server.port.to_string()),
        ConfigField::new(
            "server.graceful_shutdown_secs",
            &["THREADLINK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        ConfigField::new(
            "logging.level",
            &["THREADLINK_LOGGING_LEVEL", "THREADLINK_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        ConfigField::new(
            "logging.format",
            &["THREADLINK_LOGGING_FORMAT", "THREADLINK_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::display)
                .map(|display| display.to_string())
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

pub(crate) fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
