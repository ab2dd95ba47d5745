//! Slack Web API client for posting thread replies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use threadlink_core::config::SlackConfig;
use threadlink_core::UpstreamError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackApiError {
    /// Slack answered but refused the call (`"ok": false`).
    #[error("slack api error `{error}` (status {status})")]
    Api { status: u16, error: String },
    #[error("slack returned http status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("slack request failed: {0}")]
    Transport(String),
}

impl SlackApiError {
    pub fn into_upstream(self) -> UpstreamError {
        match self {
            Self::Api { status, error } => UpstreamError::new(status, error),
            Self::Http { status, body } => UpstreamError::new(status, body),
            Self::Transport(detail) => UpstreamError::transport(detail),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Posts `text` to `channel`, as a thread reply when `thread_ts` is set.
    /// Returns the decoded Slack response on success.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<Value, SlackApiError>;
}

#[async_trait]
impl<T> ChatTransport for Arc<T>
where
    T: ChatTransport + ?Sized,
{
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<Value, SlackApiError> {
        self.as_ref().post_message(channel, text, thread_ts).await
    }
}

#[derive(Debug, Deserialize)]
struct ChatPostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackWebClient {
    http: Client,
    api_base: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(
        api_base: &str,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_base: api_base.trim_end_matches('/').to_string(), bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.api_base_url,
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }
}

#[async_trait]
impl ChatTransport for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<Value, SlackApiError> {
        let mut payload = json!({ "channel": channel, "text": text });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackApiError::Http { status: status.as_u16(), body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| SlackApiError::Transport(format!("invalid slack response: {error}")))?;
        let envelope: ChatPostMessageResponse = serde_json::from_value(body.clone())
            .map_err(|error| SlackApiError::Transport(format!("invalid slack response: {error}")))?;

        if !envelope.ok {
            return Err(SlackApiError::Api {
                status: status.as_u16(),
                error: envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        Ok(body)
    }
}
