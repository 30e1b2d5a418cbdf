//! Toast-style notification dispatch.
//!
//! The workflow reports operation outcomes through a [`NotificationSink`];
//! rendering is the UI layer's job. Dispatch is fire-and-forget: a sink never
//! fails and never blocks the workflow.

use tokio::sync::mpsc;

/// Notification severity levels for styling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    /// Informational message.
    #[default]
    Info,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Success message.
    Success,
}

/// A transient, non-blocking user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity level for styling.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Longer description shown under the title.
    pub description: String,
}

impl Notification {
    /// Create a success notification.
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { severity: Severity::Success, title: title.into(), description: description.into() }
    }

    /// Create an error notification.
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { severity: Severity::Error, title: title.into(), description: description.into() }
    }

    /// Create an info notification.
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { severity: Severity::Info, title: title.into(), description: description.into() }
    }
}

/// Outlet for user-visible notifications. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification. Must not block or fail.
    fn notify(&self, notification: Notification);
}

/// Channel-backed sink: the UI holds the receiver and drains it into toasts.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the UI drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A dropped receiver just means nobody is rendering toasts anymore.
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped; message discarded");
        }
    }
}
