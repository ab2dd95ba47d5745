//! Slack side of threadlink
//!
//! - **Events** (`events`) - classifies webhook payloads into handshake / message
//! - **Web API** (`api`) - `chat.postMessage` over the bot token
//! - **Notifier** (`notifier`) - in-thread replies with a bounded retry policy
//! - **Signature** (`signature`) - `X-Slack-Signature` verification
//! - **Gateway** (`gateway`) - request body in, `{statusCode, body}` out
//!
//! # Architecture
//!
//! ```text
//! Webhook body → WebhookGateway → validate → EventProcessor → Jira
//!                                                   ↓
//!                                   SlackNotifier ← issue link
//! ```

pub mod api;
pub mod events;
pub mod gateway;
pub mod notifier;
pub mod signature;

pub use api::{ChatTransport, SlackApiError, SlackWebClient};
pub use events::validate;
pub use gateway::{InvocationResponse, WebhookGateway};
pub use notifier::{RetryPolicy, SlackNotifier};
pub use signature::{verify_request_signature, SignatureError};
