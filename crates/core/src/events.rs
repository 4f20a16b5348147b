//! User-facing notifications emitted by the sync engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Outcome of reconciling one remote record, keyed by the quote text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Notification {
    Added(String),
    Updated(String),
    Conflict(String),
}

impl Notification {
    /// Text of the affected quote.
    pub fn text(&self) -> &str {
        match self {
            Self::Added(text) | Self::Updated(text) | Self::Conflict(text) => text,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(text) => write!(f, "New quote added from server: {text}"),
            Self::Updated(text) => write!(f, "Quote updated from server: {text}"),
            Self::Conflict(text) => write!(
                f,
                "Conflict: quote already exists with a different category: {text}"
            ),
        }
    }
}

/// Surface that receives notifications and reported failures.
///
/// Runtimes (CLI, UI bridges) implement this to show messages to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);

    /// Called for failures that were caught at an operation boundary.
    fn report_failure(&self, context: &str, error: &Error) {
        log::warn!("[QuoteSync] {} failed: {}", context, error);
    }
}

/// Sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: &Notification) {
        log::info!("[QuoteSync] {}", notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_messages_name_the_quote() {
        assert_eq!(
            Notification::Added("Keep going".into()).to_string(),
            "New quote added from server: Keep going"
        );
        assert_eq!(
            Notification::Updated("Keep going".into()).to_string(),
            "Quote updated from server: Keep going"
        );
        assert!(Notification::Conflict("Keep going".into())
            .to_string()
            .ends_with("Keep going"));
    }

    #[test]
    fn notification_serialization_is_tagged() {
        let json = serde_json::to_string(&Notification::Conflict("A".into())).expect("serialize");
        assert_eq!(json, r#"{"kind":"conflict","text":"A"}"#);
    }
}
