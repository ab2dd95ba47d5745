use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use threadlink_core::config::NotifyConfig;
use threadlink_core::{ThreadNotifier, UpstreamError};
use tracing::{info, warn};

use crate::api::{ChatTransport, SlackApiError};

const NO_MESSAGE: &str = "No message";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(2) }
    }
}

impl From<&NotifyConfig> for RetryPolicy {
    fn from(config: &NotifyConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), delay: Duration::ZERO }
    }
}

/// Posts replies into the configured channel, retrying every failure kind
/// until the policy's attempt budget is spent.
pub struct SlackNotifier<T> {
    transport: T,
    channel_id: String,
    policy: RetryPolicy,
}

impl<T> SlackNotifier<T>
where
    T: ChatTransport,
{
    pub fn new(transport: T, channel_id: impl Into<String>, policy: RetryPolicy) -> Self {
        Self { transport, channel_id: channel_id.into(), policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn post_with_retry(
        &self,
        message: &str,
        thread_anchor: &str,
    ) -> Result<Value, SlackApiError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.post_message(&self.channel_id, message, Some(thread_anchor)).await
            {
                Ok(response) => {
                    info!(
                        event_name = "egress.slack.notify_sent",
                        thread_id = thread_anchor,
                        attempt,
                        "Message successfully sent"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    warn!(
                        event_name = "egress.slack.notify_retry",
                        thread_id = thread_anchor,
                        attempt,
                        max_attempts,
                        error = %error,
                        "Error while sending message"
                    );
                    if attempt >= max_attempts {
                        return Err(error);
                    }
                }
            }

            attempt += 1;
            if !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }
    }
}

#[async_trait]
impl<T> ThreadNotifier for SlackNotifier<T>
where
    T: ChatTransport + 'static,
{
    async fn post(&self, message: &str, thread_anchor: &str) -> Result<Value, UpstreamError> {
        let response = self
            .post_with_retry(message, thread_anchor)
            .await
            .map_err(SlackApiError::into_upstream)?;
        Ok(response.get("message").cloned().unwrap_or_else(|| Value::String(NO_MESSAGE.to_owned())))
    }
}
