//! User-facing notifications.
//!
//! The store never propagates remote failures to its caller; outcomes that
//! the user should see (a failed add, a reverted delete) go through a
//! [`NotificationSink`]. Sinks are fire-and-forget and must not block.

use std::fmt;

/// Outcome category for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Operation confirmed.
    Success,
    /// Operation rejected and rolled back.
    Error,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Outcome category.
    pub kind: NotificationKind,
    /// Human-readable message.
    pub message: String,
}

impl Notification {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Sink for user-facing notifications.
///
/// `notify` must return promptly; implementations that deliver somewhere
/// slow should hand off internally rather than block the store.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification.
    fn notify(&self, notification: Notification);
}

/// Sink that emits notifications to the tracing log.
///
/// The default for headless deployments and the binary's fallback when no
/// UI channel is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(message = %notification.message, "cart notification");
            }
            NotificationKind::Error => {
                tracing::warn!(message = %notification.message, "cart notification");
            }
        }
    }
}
