use std::fmt;

/// Permalink-shaped identifier of a Slack thread.
///
/// Used as the dedup key when searching the tracker and embedded verbatim in
/// issue descriptions, so the format must never change for existing threads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadReference(String);

impl ThreadReference {
    pub fn new(workspace_domain: &str, channel_id: &str, root_ts: &str) -> Self {
        let compact_ts = root_ts.replace('.', "");
        Self(format!("https://{workspace_domain}/archives/{channel_id}/p{compact_ts}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ThreadReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadReference;

    #[test]
    fn builds_slack_permalink_form() {
        let reference = ThreadReference::new("acme.slack.com", "C123", "1700000000.000100");
        assert_eq!(reference.as_str(), "https://acme.slack.com/archives/C123/p1700000000000100");
    }

    #[test]
    fn same_thread_yields_identical_reference() {
        let first = ThreadReference::new("acme.slack.com", "C123", "1700000000.000100");
        let second = ThreadReference::new("acme.slack.com", "C123", "1700000000.000100");
        assert_eq!(first, second);
        assert_ne!(first, ThreadReference::new("acme.slack.com", "C999", "1700000000.000100"));
    }
}
