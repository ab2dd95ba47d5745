use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::event::MessageEvent;
use crate::domain::issue::{IssueRecord, NewIssue};
use crate::domain::outcome::{NotificationStatus, ProcessingOutcome, RejectionReason};
use crate::domain::thread::ThreadReference;
use crate::errors::UpstreamError;
use crate::summary::extract_summary;
use crate::timestamps::localize;

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// True when at least one issue already references the thread. Lookup
    /// failures must resolve to `false` so a message is never silently dropped.
    async fn search(&self, reference: &ThreadReference) -> bool;
    async fn create(&self, issue: &NewIssue) -> Result<IssueRecord, UpstreamError>;
}

#[async_trait]
pub trait ThreadNotifier: Send + Sync {
    async fn post(&self, message: &str, thread_anchor: &str) -> Result<Value, UpstreamError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug)]
pub struct ProcessorSettings {
    pub bot_user_id: String,
    pub channel_id: String,
    pub workspace_domain: String,
    pub timezone: Tz,
}

impl From<&AppConfig> for ProcessorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            bot_user_id: config.slack.bot_user_id.clone(),
            channel_id: config.slack.channel_id.clone(),
            workspace_domain: config.slack.workspace_domain.clone(),
            timezone: config.display.timezone,
        }
    }
}

pub struct EventProcessor {
    tracker: Arc<dyn IssueTracker>,
    notifier: Arc<dyn ThreadNotifier>,
    settings: ProcessorSettings,
}

impl EventProcessor {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        notifier: Arc<dyn ThreadNotifier>,
        settings: ProcessorSettings,
    ) -> Self {
        Self { tracker, notifier, settings }
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn thread_reference(&self, root_ts: &str) -> ThreadReference {
        ThreadReference::new(&self.settings.workspace_domain, &self.settings.channel_id, root_ts)
    }

    pub async fn process(&self, event: &MessageEvent, ctx: &EventContext) -> ProcessingOutcome {
        let root_ts = event.thread_root();

        if event.user == self.settings.bot_user_id || event.is_reply() {
            warn!(
                event_name = "processing.event.rejected_sender",
                correlation_id = %ctx.correlation_id,
                thread_id = root_ts,
                user_id = %event.user,
                is_reply = event.is_reply(),
                "Invalid sender or event lacks thread_ts"
            );
            return ProcessingOutcome::Rejected(RejectionReason::InvalidSender);
        }

        let reference = self.thread_reference(root_ts);

        let localized = match localize(root_ts, self.settings.timezone) {
            Ok(localized) => localized,
            Err(error) => {
                error!(
                    event_name = "processing.event.invalid_timestamp",
                    correlation_id = %ctx.correlation_id,
                    thread_id = root_ts,
                    error = %error,
                    "could not convert thread timestamp to local time"
                );
                return ProcessingOutcome::Rejected(RejectionReason::InvalidTimestamp);
            }
        };

        let issue = NewIssue {
            summary: extract_summary(&event.text, &localized),
            description: format!("{} \nlink to slack thread: {}", event.text, reference),
        };

        if self.tracker.search(&reference).await {
            info!(
                event_name = "processing.dedup.issue_exists",
                correlation_id = %ctx.correlation_id,
                thread_id = root_ts,
                thread_reference = %reference,
                "Issue corresponding to thread already exists on Jira"
            );
            return ProcessingOutcome::AlreadyExists;
        }

        let record = match self.tracker.create(&issue).await {
            Ok(record) => record,
            Err(upstream) => {
                error!(
                    event_name = "processing.tracker.create_failed",
                    correlation_id = %ctx.correlation_id,
                    thread_id = root_ts,
                    status = upstream.status,
                    detail = %upstream.detail,
                    "Error while creating Jira issue"
                );
                return ProcessingOutcome::UpstreamError(upstream);
            }
        };

        info!(
            event_name = "processing.tracker.issue_created",
            correlation_id = %ctx.correlation_id,
            thread_id = root_ts,
            issue_key = %record.key,
            "tracker issue created for thread"
        );

        let message = format!("Incoming message. A Jira issue was created: {}", record.link);
        let notification = match self.notifier.post(&message, root_ts).await {
            Ok(value) => NotificationStatus::Delivered(value),
            Err(upstream) => {
                warn!(
                    event_name = "processing.notify.gave_up",
                    correlation_id = %ctx.correlation_id,
                    thread_id = root_ts,
                    status = upstream.status,
                    detail = %upstream.detail,
                    "thread reply was not delivered; issue remains created"
                );
                NotificationStatus::Failed(upstream)
            }
        };

        ProcessingOutcome::Created { link: record.link, notification }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{EventContext, EventProcessor, IssueTracker, ProcessorSettings, ThreadNotifier};
    use crate::domain::event::MessageEvent;
    use crate::domain::issue::{IssueRecord, NewIssue};
    use crate::domain::outcome::{NotificationStatus, ProcessingOutcome, RejectionReason};
    use crate::domain::thread::ThreadReference;
    use crate::errors::UpstreamError;

    #[derive(Default)]
    struct ScriptedTracker {
        state: Mutex<TrackerState>,
    }

    #[derive(Default)]
    struct TrackerState {
        existing: bool,
        create_results: VecDeque<Result<IssueRecord, UpstreamError>>,
        searches: Vec<String>,
        created: Vec<NewIssue>,
    }

    impl ScriptedTracker {
        fn with_script(
            existing: bool,
            create_results: Vec<Result<IssueRecord, UpstreamError>>,
        ) -> Self {
            Self {
                state: Mutex::new(TrackerState {
                    existing,
                    create_results: create_results.into(),
                    ..TrackerState::default()
                }),
            }
        }

        async fn searches(&self) -> Vec<String> {
            self.state.lock().await.searches.clone()
        }

        async fn created(&self) -> Vec<NewIssue> {
            self.state.lock().await.created.clone()
        }
    }

    #[async_trait]
    impl IssueTracker for ScriptedTracker {
        async fn search(&self, reference: &ThreadReference) -> bool {
            let mut state = self.state.lock().await;
            state.searches.push(reference.to_string());
            state.existing
        }

        async fn create(&self, issue: &NewIssue) -> Result<IssueRecord, UpstreamError> {
            let mut state = self.state.lock().await;
            state.created.push(issue.clone());
            state.create_results.pop_front().unwrap_or_else(|| {
                Err(UpstreamError::new(599, "no scripted create result"))
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        state: Mutex<NotifierState>,
    }

    #[derive(Default)]
    struct NotifierState {
        fail: bool,
        posts: Vec<(String, String)>,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self { state: Mutex::new(NotifierState { fail: true, posts: Vec::new() }) }
        }

        async fn posts(&self) -> Vec<(String, String)> {
            self.state.lock().await.posts.clone()
        }
    }

    #[async_trait]
    impl ThreadNotifier for RecordingNotifier {
        async fn post(&self, message: &str, thread_anchor: &str) -> Result<Value, UpstreamError> {
            let mut state = self.state.lock().await;
            state.posts.push((message.to_owned(), thread_anchor.to_owned()));
            if state.fail {
                Err(UpstreamError::new(429, "ratelimited"))
            } else {
                Ok(json!({ "text": message }))
            }
        }
    }

    fn settings() -> ProcessorSettings {
        ProcessorSettings {
            bot_user_id: "U_BOT".to_owned(),
            channel_id: "C123".to_owned(),
            workspace_domain: "acme.slack.com".to_owned(),
            timezone: chrono_tz::America::Sao_Paulo,
        }
    }

    fn message(user: &str, text: &str, ts: &str, thread_ts: Option<&str>) -> MessageEvent {
        MessageEvent {
            user: user.to_owned(),
            text: text.to_owned(),
            ts: ts.to_owned(),
            thread_ts: thread_ts.map(str::to_owned),
            channel: None,
        }
    }

    fn created(key: &str) -> Result<IssueRecord, UpstreamError> {
        Ok(IssueRecord {
            key: key.to_owned(),
            link: format!("https://jira.example.net/browse/{key}"),
        })
    }

    fn processor(
        tracker: &Arc<ScriptedTracker>,
        notifier: &Arc<RecordingNotifier>,
    ) -> EventProcessor {
        EventProcessor::new(tracker.clone(), notifier.clone(), settings())
    }

    #[tokio::test]
    async fn creates_issue_and_replies_in_thread() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-42")]));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(
                &message("U1", "Server down\nmore info", "1700000000.000100", None),
                &EventContext::default(),
            )
            .await;

        let ProcessingOutcome::Created { link, notification } = outcome else {
            panic!("expected created outcome, got {outcome:?}");
        };
        assert!(link.ends_with("/browse/KEY-42"));
        assert!(matches!(notification, NotificationStatus::Delivered(_)));

        assert_eq!(
            tracker.searches().await,
            vec!["https://acme.slack.com/archives/C123/p1700000000000100".to_owned()]
        );
        let issues = tracker.created().await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].summary, "Message - Server down");
        assert_eq!(
            issues[0].description,
            "Server down\nmore info \nlink to slack thread: \
             https://acme.slack.com/archives/C123/p1700000000000100"
        );

        let posts = notifier.posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].0,
            "Incoming message. A Jira issue was created: https://jira.example.net/browse/KEY-42"
        );
        assert_eq!(posts[0].1, "1700000000.000100");
    }

    #[tokio::test]
    async fn existing_issue_short_circuits_create_and_notify() {
        let tracker = Arc::new(ScriptedTracker::with_script(true, vec![created("KEY-1")]));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(&message("U1", "Bug found", "1700000000.000100", None), &EventContext::default())
            .await;

        assert_eq!(outcome, ProcessingOutcome::AlreadyExists);
        assert_eq!(tracker.searches().await.len(), 1);
        assert!(tracker.created().await.is_empty());
        assert!(notifier.posts().await.is_empty());
    }

    #[tokio::test]
    async fn bot_messages_are_rejected_before_any_tracker_call() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-1")]));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(&message("U_BOT", "hi", "1700000000.000100", None), &EventContext::default())
            .await;

        assert_eq!(outcome, ProcessingOutcome::Rejected(RejectionReason::InvalidSender));
        assert!(tracker.searches().await.is_empty());
        assert!(tracker.created().await.is_empty());
    }

    #[tokio::test]
    async fn thread_replies_are_rejected() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-1")]));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(
                &message("U1", "me too", "1700000099.000100", Some("1700000000.000100")),
                &EventContext::default(),
            )
            .await;

        assert_eq!(outcome, ProcessingOutcome::Rejected(RejectionReason::InvalidSender));
        assert!(tracker.searches().await.is_empty());
    }

    #[tokio::test]
    async fn unparseable_timestamp_is_rejected_before_tracker_calls() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-1")]));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(&message("U1", "hello", "yesterday", None), &EventContext::default())
            .await;

        assert_eq!(outcome, ProcessingOutcome::Rejected(RejectionReason::InvalidTimestamp));
        assert!(tracker.searches().await.is_empty());
        assert!(tracker.created().await.is_empty());
    }

    #[tokio::test]
    async fn create_failure_is_reported_without_notification() {
        let tracker = Arc::new(ScriptedTracker::with_script(
            false,
            vec![Err(UpstreamError::new(400, r#"{"errors":{"summary":"required"}}"#))],
        ));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = processor(&tracker, &notifier)
            .process(&message("U1", "hello", "1700000000.000100", None), &EventContext::default())
            .await;

        assert_eq!(
            outcome,
            ProcessingOutcome::UpstreamError(UpstreamError::new(
                400,
                r#"{"errors":{"summary":"required"}}"#
            ))
        );
        assert_eq!(tracker.created().await.len(), 1, "create must not be retried");
        assert!(notifier.posts().await.is_empty());
    }

    #[tokio::test]
    async fn notification_failure_keeps_created_outcome() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-7")]));
        let notifier = Arc::new(RecordingNotifier::failing());

        let outcome = processor(&tracker, &notifier)
            .process(&message("U1", "hello", "1700000000.000100", None), &EventContext::default())
            .await;

        assert_eq!(
            outcome,
            ProcessingOutcome::Created {
                link: "https://jira.example.net/browse/KEY-7".to_owned(),
                notification: NotificationStatus::Failed(UpstreamError::new(429, "ratelimited")),
            }
        );
    }

    #[tokio::test]
    async fn empty_first_line_uses_localized_timestamp_summary() {
        let tracker = Arc::new(ScriptedTracker::with_script(false, vec![created("KEY-3")]));
        let notifier = Arc::new(RecordingNotifier::default());

        processor(&tracker, &notifier)
            .process(
                &message("U1", "\nstack trace below", "1700000000.000100", None),
                &EventContext::default(),
            )
            .await;

        let issues = tracker.created().await;
        assert_eq!(issues[0].summary, "Message - 14/11 - 19:13");
    }

    #[test]
    fn thread_reference_is_stable_for_repeated_derivations() {
        let tracker = Arc::new(ScriptedTracker::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(&tracker, &notifier);

        let first = processor.thread_reference("1700000000.000100");
        let second = processor.thread_reference("1700000000.000100");
        assert_eq!(first, second);
    }
}
