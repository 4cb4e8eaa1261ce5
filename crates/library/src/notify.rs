//! Outbound, user-facing notifications.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Sending half of a notification channel.
///
/// Whoever renders notifications holds the receiver; nobody listening is
/// not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}
impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(Level::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Level::Error, message.into());
    }

    fn send(&self, level: Level, message: String) {
        if self.tx.send(Notification { level, message }).is_err() {
            tracing::trace!("Notification dropped; no receiver");
        }
    }
}
