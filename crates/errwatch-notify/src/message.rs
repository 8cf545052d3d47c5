//! Notification payloads.

use serde::Serialize;

use errwatch_probe::ProbeOutcome;

/// Timestamp format used in alert payloads.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An alert built from a failure-classified probe outcome.
///
/// Constructed just-in-time, handed to the notifier, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub mention: String,
    pub status: u16,
    pub endpoint: String,
    /// Cluster address with surrounding `.`/`/` trimmed.
    pub cluster: String,
    pub time: String,
    /// Response body excerpt, backtick-quoted for the messenger.
    pub body: String,
}

/// A plain text line (startup announcements).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextLine {
    pub text: String,
}

/// Everything the notifier can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Alert(NotificationMessage),
    Text(TextLine),
}

impl NotificationMessage {
    /// Build an alert from a probe outcome classified as failure.
    pub fn from_outcome(
        mention: &str,
        endpoint: &str,
        cluster: &str,
        outcome: &ProbeOutcome,
    ) -> Self {
        Self {
            mention: mention.to_string(),
            status: outcome.status,
            endpoint: endpoint.to_string(),
            cluster: trim_cluster(cluster).to_string(),
            time: outcome.at.format(TIME_FORMAT).to_string(),
            body: format!("`{}`", outcome.body),
        }
    }
}

impl OutboundMessage {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text(TextLine { text: text.into() })
    }
}

/// Strip leading/trailing `.` and `/` from a cluster address segment.
fn trim_cluster(cluster: &str) -> &str {
    cluster.trim_matches(|c| c == '.' || c == '/')
}
