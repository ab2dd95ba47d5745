use serde::{Deserialize, Serialize};

/// A webhook payload after validation. Anything that is neither shape never
/// makes it past the validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Handshake { challenge: String },
    Message(MessageEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub user: String,
    pub text: String,
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl MessageEvent {
    /// Timestamp of the first message of the thread this event belongs to.
    pub fn thread_root(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }

    pub fn is_reply(&self) -> bool {
        self.thread_ts.is_some()
    }
}
