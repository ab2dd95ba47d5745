use std::sync::Arc;

use threadlink_core::config::{AppConfig, ConfigError, LoadOptions};
use threadlink_core::{EventProcessor, ProcessorSettings};
use threadlink_jira::JiraClient;
use threadlink_slack::{RetryPolicy, SlackNotifier, SlackWebClient, WebhookGateway};
use thiserror::Error;
use tracing::{info, warn};

use crate::routes::{AppState, SigningSettings};

pub struct Application {
    pub config: AppConfig,
    pub gateway: Arc<WebhookGateway>,
}

impl Application {
    pub fn state(&self) -> AppState {
        AppState {
            gateway: self.gateway.clone(),
            signing: SigningSettings::from_config(&self.config.slack),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let tracker = JiraClient::from_config(&config.jira).map_err(BootstrapError::HttpClient)?;
    let transport = SlackWebClient::from_config(&config.slack).map_err(BootstrapError::HttpClient)?;
    let notifier = SlackNotifier::new(
        transport,
        config.slack.channel_id.clone(),
        RetryPolicy::from(&config.notify),
    );
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        jira_base_url = %config.jira.base_url,
        project_key = %config.jira.project_key,
        notify_max_attempts = notifier.policy().max_attempts,
        "tracker and notifier clients initialized"
    );

    if config.slack.signing_secret.is_none() {
        warn!(
            event_name = "system.bootstrap.signature_check_disabled",
            correlation_id = "bootstrap",
            thread_id = "unknown",
            "slack.signing_secret is not set; webhook signatures will not be verified"
        );
    }

    let processor = EventProcessor::new(
        Arc::new(tracker),
        Arc::new(notifier),
        ProcessorSettings::from(&config),
    );

    Ok(Application { config, gateway: Arc::new(WebhookGateway::new(processor)) })
}
