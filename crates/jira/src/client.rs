use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use threadlink_core::config::JiraConfig;
use threadlink_core::{IssueRecord, IssueTracker, NewIssue, ThreadReference, UpstreamError};
use tracing::{error, info};

const SEARCH_PATH: &str = "/rest/api/2/search";
const ISSUE_PATH: &str = "/rest/api/2/issue";

#[derive(Clone, Debug)]
pub struct JiraSettings {
    pub base_url: String,
    pub username: String,
    pub api_token: SecretString,
    pub project_key: String,
    pub issue_type: String,
    pub timeout_secs: u64,
}

impl From<&JiraConfig> for JiraSettings {
    fn from(config: &JiraConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
            project_key: config.project_key.clone(),
            issue_type: config.issue_type.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedIssueResponse {
    key: Option<String>,
}

#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    settings: JiraSettings,
}

impl JiraClient {
    pub fn new(mut settings: JiraSettings) -> Result<Self, reqwest::Error> {
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn from_config(config: &JiraConfig) -> Result<Self, reqwest::Error> {
        Self::new(JiraSettings::from(config))
    }

    /// JQL matching any issue in the project whose text contains the reference.
    pub fn search_query(&self, reference: &ThreadReference) -> String {
        format!("project = {} AND text ~ \"{}\"", self.settings.project_key, reference)
    }

    pub fn browse_link(&self, issue_key: &str) -> String {
        format!("{}/browse/{issue_key}", self.settings.base_url)
    }

    fn create_payload(&self, issue: &NewIssue) -> Value {
        json!({
            "fields": {
                "project": { "key": self.settings.project_key },
                "summary": issue.summary,
                "description": issue.description,
                "issuetype": { "name": self.settings.issue_type },
            }
        })
    }

    async fn try_search(&self, jql: &str) -> Result<bool, UpstreamError> {
        let response = self
            .http
            .get(format!("{}{SEARCH_PATH}", self.settings.base_url))
            .basic_auth(&self.settings.username, Some(self.settings.api_token.expose_secret()))
            .query(&[("jql", jql)])
            .send()
            .await
            .map_err(|error| UpstreamError::transport(error.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::new(status.as_u16(), body));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|error| UpstreamError::transport(format!("invalid search response: {error}")))?;
        Ok(!payload.issues.is_empty())
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn search(&self, reference: &ThreadReference) -> bool {
        let jql = self.search_query(reference);
        match self.try_search(&jql).await {
            Ok(found) => found,
            Err(upstream) => {
                error!(
                    event_name = "tracker.jira.search_failed",
                    thread_reference = %reference,
                    status = upstream.status,
                    detail = %upstream.detail,
                    "Error while getting Jira issue; treating thread as not yet tracked"
                );
                false
            }
        }
    }

    async fn create(&self, issue: &NewIssue) -> Result<IssueRecord, UpstreamError> {
        let response = self
            .http
            .post(format!("{}{ISSUE_PATH}", self.settings.base_url))
            .basic_auth(&self.settings.username, Some(self.settings.api_token.expose_secret()))
            .json(&self.create_payload(issue))
            .send()
            .await
            .map_err(|error| {
                error!(
                    event_name = "tracker.jira.create_transport_failed",
                    error = %error,
                    "Error while creating Jira issue"
                );
                UpstreamError::transport(error.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| UpstreamError::transport(error.to_string()))?;

        if status != StatusCode::CREATED {
            error!(
                event_name = "tracker.jira.create_rejected",
                status = status.as_u16(),
                detail = %body,
                "Error while creating Jira issue"
            );
            return Err(UpstreamError::new(status.as_u16(), body));
        }

        let key = serde_json::from_str::<CreatedIssueResponse>(&body)
            .ok()
            .and_then(|created| created.key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                UpstreamError::transport(format!("create response did not include an issue key: {body}"))
            })?;

        info!(event_name = "tracker.jira.issue_created", issue_key = %key, "An issue was created!");
        Ok(IssueRecord { link: self.browse_link(&key), key })
    }
}
