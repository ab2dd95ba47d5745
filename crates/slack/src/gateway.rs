//! Request body in, `{statusCode, body}` out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use threadlink_core::{
    EventContext, EventProcessor, InboundEvent, IngressError, ProcessingOutcome,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::validate;

const CREATED_MESSAGE: &str = "Message processed and issue created";
const EXISTS_MESSAGE: &str = "Issue corresponding to thread already exists on Jira";
const CREATE_FAILED_MESSAGE: &str = "Error while creating Jira issue";

/// Response in the serverless shape: status code plus a JSON-encoded body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        Self { status_code, body }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &ErrorBody { error: message })
    }

}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct ChallengeBody<'a> {
    challenge: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct CreatedBody<'a> {
    message: &'a str,
    link: &'a str,
    #[serde(rename = "slack return")]
    slack_return: Value,
}

#[derive(Serialize)]
struct CreateFailedBody<'a> {
    error: &'a str,
    jira_response: &'a str,
}

pub struct WebhookGateway {
    processor: EventProcessor,
}

impl WebhookGateway {
    pub fn new(processor: EventProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    /// Handles a raw webhook body as received over HTTP.
    pub async fn handle_body(&self, raw: &str) -> InvocationResponse {
        let ctx = new_context();
        self.handle_raw(raw, &ctx).await
    }

    /// Handles a serverless invocation envelope (`{"body": "<json string>"}`).
    /// An already-decoded object under `body` is accepted as well.
    pub async fn handle_invocation(&self, envelope: &Value) -> InvocationResponse {
        let ctx = new_context();
        match envelope.get("body") {
            None | Some(Value::Null) => reject(&ctx, IngressError::MissingBody),
            Some(Value::String(raw)) => self.handle_raw(raw, &ctx).await,
            Some(payload) if payload.is_object() => self.handle_payload(payload, &ctx).await,
            Some(other) => reject(
                &ctx,
                IngressError::Parse(format!("body must be a JSON string, got {other}")),
            ),
        }
    }

    async fn handle_raw(&self, raw: &str, ctx: &EventContext) -> InvocationResponse {
        if raw.trim().is_empty() {
            return reject(ctx, IngressError::MissingBody);
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(payload) => self.handle_payload(&payload, ctx).await,
            Err(error) => reject(ctx, IngressError::Parse(error.to_string())),
        }
    }

    async fn handle_payload(&self, payload: &Value, ctx: &EventContext) -> InvocationResponse {
        let event = match validate(payload) {
            Ok(event) => event,
            Err(error) => return reject(ctx, error),
        };

        let message = match event {
            InboundEvent::Handshake { challenge } => {
                info!(
                    event_name = "ingress.slack.handshake",
                    correlation_id = %ctx.correlation_id,
                    "answering url verification challenge"
                );
                return InvocationResponse::json(200, &ChallengeBody { challenge: &challenge });
            }
            InboundEvent::Message(message) => message,
        };

        info!(
            event_name = "ingress.slack.message_received",
            correlation_id = %ctx.correlation_id,
            thread_id = message.thread_root(),
            user_id = %message.user,
            "message event accepted for processing"
        );

        let outcome = self.processor.process(&message, ctx).await;
        info!(
            event_name = "ingress.slack.processed",
            correlation_id = %ctx.correlation_id,
            thread_id = message.thread_root(),
            outcome = outcome.label(),
            "event processing finished"
        );
        respond(&outcome)
    }
}

fn new_context() -> EventContext {
    EventContext { correlation_id: Uuid::new_v4().to_string() }
}

fn reject(ctx: &EventContext, error: IngressError) -> InvocationResponse {
    warn!(
        event_name = "ingress.slack.rejected",
        correlation_id = %ctx.correlation_id,
        error = %error,
        "inbound request rejected"
    );
    InvocationResponse::error(error.status_code(), error.client_message())
}

fn respond(outcome: &ProcessingOutcome) -> InvocationResponse {
    match outcome {
        ProcessingOutcome::Created { link, notification } => InvocationResponse::json(
            200,
            &CreatedBody { message: CREATED_MESSAGE, link, slack_return: notification.report() },
        ),
        ProcessingOutcome::AlreadyExists => {
            InvocationResponse::json(200, &MessageBody { message: EXISTS_MESSAGE })
        }
        ProcessingOutcome::Rejected(reason) => InvocationResponse::error(400, reason.message()),
        ProcessingOutcome::UpstreamError(upstream) => InvocationResponse::json(
            400,
            &CreateFailedBody { error: CREATE_FAILED_MESSAGE, jira_response: &upstream.detail },
        ),
    }
}
