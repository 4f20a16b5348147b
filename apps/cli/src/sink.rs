use std::sync::atomic::{AtomicBool, Ordering};

use quotesync_core::{Error, Notification, NotificationSink};

/// Prints sync notifications to stdout and user-facing failures to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    reported: AtomicBool,
}

impl ConsoleSink {
    /// Whether a failure has already been shown to the user.
    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::SeqCst)
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: &Notification) {
        println!("{notification}");
    }

    fn report_failure(&self, context: &str, error: &Error) {
        self.reported.store(true, Ordering::SeqCst);
        eprintln!("{context} failed: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_reported_failures() {
        let sink = ConsoleSink::default();
        sink.notify(&Notification::Added("Keep going".into()));
        assert!(!sink.has_reported());

        sink.report_failure("Importing quotes", &Error::validation("import item 0"));
        assert!(sink.has_reported());
    }
}
