use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Destructive,
}

/// User-visible message handed to the host's toast collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Toast {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Destructive)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Info)
    }
}

/// Sink for non-fatal, user-visible errors
pub trait Notifier {
    fn notify(&mut self, toast: Toast);
}

/// Forwards toasts to whoever holds the receiving end
impl Notifier for flume::Sender<Toast> {
    fn notify(&mut self, toast: Toast) {
        let _ = self.send(toast);
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, toast: Toast) {
        match toast.severity {
            Severity::Info => log::info!("{}: {}", toast.title, toast.description),
            Severity::Destructive => log::error!("{}: {}", toast.title, toast.description),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub toast: Toast,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(toast: Toast, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            toast,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Stack of on-screen toasts with expiry, newest first
#[derive(Debug)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(5))
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            default_duration,
        }
    }

    pub fn show(&mut self, toast: Toast) {
        self.notifications
            .insert(0, Notification::new(toast, self.default_duration));
    }

    /// Remove expired notifications, returns true if any were removed
    pub fn update(&mut self) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired());
        self.notifications.len() != before
    }

    pub fn current(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&mut self, toast: Toast) {
        self.show(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_toast_is_current() {
        let mut center = NotificationCenter::new();
        center.notify(Toast::info("a", "first"));
        center.notify(Toast::error("b", "second"));

        assert_eq!(center.len(), 2);
        let current = center.current().expect("toast");
        assert_eq!(current.toast.description, "second");
        assert_eq!(current.toast.severity, Severity::Destructive);
    }

    #[test]
    fn expired_toasts_are_dropped() {
        let mut center = NotificationCenter::with_default_duration(Duration::ZERO);
        center.show(Toast::info("t", "gone"));

        assert!(center.update());
        assert!(center.is_empty());
        assert!(!center.update());
    }

    #[test]
    fn channel_notifier_forwards() {
        let (mut tx, rx) = flume::unbounded::<Toast>();
        tx.notify(Toast::error("Render failed", "page 2"));

        assert_eq!(
            rx.try_recv().ok(),
            Some(Toast::error("Render failed", "page 2"))
        );
    }
}
