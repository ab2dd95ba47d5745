use serde_json::Value;

use crate::errors::UpstreamError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// Sent by the bot itself, or a reply inside an existing thread.
    InvalidSender,
    InvalidTimestamp,
}

impl RejectionReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidSender => "Invalid sender or event lacks thread_ts",
            Self::InvalidTimestamp => "Invalid timestamp",
        }
    }
}

/// Result of posting the "issue created" reply. Failure here never fails the
/// request because the issue already exists at that point.
#[derive(Clone, Debug, PartialEq)]
pub enum NotificationStatus {
    Delivered(Value),
    Failed(UpstreamError),
}

impl NotificationStatus {
    /// Value reported back under `slack return`.
    pub fn report(&self) -> Value {
        match self {
            Self::Delivered(value) => value.clone(),
            Self::Failed(error) => Value::String(error.detail.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProcessingOutcome {
    Created { link: String, notification: NotificationStatus },
    AlreadyExists,
    Rejected(RejectionReason),
    UpstreamError(UpstreamError),
}

impl ProcessingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::AlreadyExists => "already_exists",
            Self::Rejected(_) => "rejected",
            Self::UpstreamError(_) => "upstream_error",
        }
    }
}
