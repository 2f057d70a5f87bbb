//! Notification delivery abstraction.
//!
//! The ledger decides when and to whom to notify; delivery itself is
//! behind the `Notifier` trait so the core never performs I/O directly.

use std::sync::Mutex;

/// Fire-and-forget notification delivery
pub trait Notifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str);
}

/// Notifier that renders messages through the tracing log output.
///
/// This is the console delivery used by the CLI.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) {
        tracing::info!(recipient, subject, "notification sent");
        println!("[notify] to: {recipient}\n  subject: {subject}\n  {body}");
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every message for later inspection.
///
/// Used in tests to assert who was notified and in what order.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) {
        self.sent.lock().expect("notifier lock poisoned").push(SentNotification {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_preserves_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("a@example.com", "first", "body one");
        notifier.notify("b@example.com", "second", "body two");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipient, "a@example.com");
        assert_eq!(sent[1].subject, "second");
    }
}
