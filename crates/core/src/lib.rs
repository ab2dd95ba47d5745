//! Core of threadlink: configuration, domain types and the event processor
//! that turns a thread-opening Slack message into exactly one Jira issue.

pub mod config;
pub mod domain;
pub mod errors;
pub mod processor;
pub mod summary;
pub mod timestamps;

pub use domain::event::{InboundEvent, MessageEvent};
pub use domain::issue::{IssueRecord, NewIssue};
pub use domain::outcome::{NotificationStatus, ProcessingOutcome, RejectionReason};
pub use domain::thread::ThreadReference;
pub use errors::{IngressError, UpstreamError};
pub use processor::{EventContext, EventProcessor, IssueTracker, ProcessorSettings, ThreadNotifier};
pub use timestamps::TimestampError;
