//! HTTP surface of threadlink: the Slack events webhook, a serverless-style
//! invocation endpoint and a health probe, all backed by one `WebhookGateway`.

pub mod bootstrap;
pub mod health;
pub mod routes;

pub use bootstrap::{bootstrap, bootstrap_with_config, Application, BootstrapError};
pub use routes::{router, AppState};
