use thiserror::Error;

use crate::domain::outcome::RejectionReason;
use crate::timestamps::TimestampError;

/// Failure reported by the tracker or the chat platform.
///
/// `status` is the HTTP status the upstream answered with, or 500 when the
/// request never produced a response (connect/timeout/decode failures).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("upstream returned status {status}: {detail}")]
pub struct UpstreamError {
    pub status: u16,
    pub detail: String,
}

impl UpstreamError {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(500, detail)
    }
}

/// Problems with the inbound request itself. None of these are retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngressError {
    #[error("request has no body")]
    MissingBody,
    #[error("request body is not valid JSON: {0}")]
    Parse(String),
    #[error("event payload rejected: {0}")]
    Validation(String),
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    #[error("sender is the bot itself or the message is a thread reply")]
    RejectedSender,
}

impl IngressError {
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Text placed in the `error` field of the response body.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MissingBody => "Requisition lacks body",
            Self::Parse(_) => "invalid JSON",
            Self::Validation(_) => "Event type not valid or lack of payload",
            Self::Timestamp(_) => RejectionReason::InvalidTimestamp.message(),
            Self::RejectedSender => RejectionReason::InvalidSender.message(),
        }
    }
}
