//! User-visible notification seam.
//!
//! State objects report their side effects (toasts, in a UI shell) through
//! the [`Notifier`] trait so the rendering layer stays external.

/// Severity of a notification, mirroring the toast variants of the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub level: Level,
}

impl Notification {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level: Level::Info,
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level: Level::Error,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier: routes notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            Level::Info => tracing::info!(title = %n.title, "{}", n.body),
            Level::Error => tracing::warn!(title = %n.title, "{}", n.body),
        }
    }
}
