use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use threadlink_core::config::SlackConfig;
use threadlink_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use threadlink_slack::{verify_request_signature, InvocationResponse, WebhookGateway};
use tracing::warn;

use crate::health::health;

const INVALID_SIGNATURE: &str = "invalid request signature";

#[derive(Clone)]
pub struct SigningSettings {
    pub secret: SecretString,
    pub max_age_secs: u64,
}

impl SigningSettings {
    pub fn from_config(config: &SlackConfig) -> Option<Self> {
        config
            .signing_secret
            .clone()
            .map(|secret| Self { secret, max_age_secs: config.signature_max_age_secs })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<WebhookGateway>,
    /// `None` disables signature verification on `/slack/events`.
    pub signing: Option<SigningSettings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(slack_events))
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .with_state(state)
}

async fn slack_events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(signing) = &state.signing {
        let verified = verify_request_signature(
            signing.secret.expose_secret(),
            header_str(&headers, TIMESTAMP_HEADER),
            header_str(&headers, SIGNATURE_HEADER),
            &body,
            Utc::now().timestamp(),
            signing.max_age_secs,
        );
        if let Err(error) = verified {
            warn!(
                event_name = "ingress.http.signature_rejected",
                correlation_id = "unknown",
                thread_id = "unknown",
                error = %error,
                "slack request signature check failed"
            );
            return into_http(InvocationResponse::error(401, INVALID_SIGNATURE));
        }
    }

    let response = match std::str::from_utf8(&body) {
        Ok(raw) => state.gateway.handle_body(raw).await,
        Err(_) => InvocationResponse::error(400, "invalid JSON"),
    };
    into_http(response)
}

/// Envelope in, envelope out. The HTTP status is always 200; the outcome
/// travels in `statusCode`.
async fn invoke(State(state): State<AppState>, body: Bytes) -> Json<InvocationResponse> {
    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => state.gateway.handle_invocation(&envelope).await,
        Err(_) if body.iter().all(u8::is_ascii_whitespace) => {
            InvocationResponse::error(400, "Requisition lacks body")
        }
        Err(_) => InvocationResponse::error(400, "invalid JSON"),
    };
    Json(response)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn into_http(response: InvocationResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], response.body).into_response()
}
