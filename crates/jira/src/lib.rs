//! Jira REST v2 client used for the dedup search and issue creation.
//!
//! Both calls authenticate with HTTP Basic (account email + API token).
//! Creation is deliberately single-shot: a blind retry could open a second
//! issue for the same thread, so recovery is left to the next dedup check.

pub mod client;

pub use client::{JiraClient, JiraSettings};
