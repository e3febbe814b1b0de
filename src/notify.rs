//! Alert presentation seam.
//!
//! Completion and reminder alerts are dispatched through the `Notifier`
//! trait. The daemon logs them; surfaces additionally render the latest
//! alert from the session snapshot.

use tracing::info;

use crate::types::Alert;

/// Trait for presenting an alert to the user.
pub trait Notifier: Send + Sync {
    /// Presents a titled alert. Must not block timer logic.
    fn notify(&self, alert: &Alert);
}

/// Notifier that writes alerts to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Creates a new logging notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, alert: &Alert) {
        info!("通知: {} - {}", alert.title, alert.body);
    }
}

/// Mock notifier for testing.
#[derive(Debug, Default)]
pub struct MockNotifier {
    notifications: std::sync::Mutex<Vec<Alert>>,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Returns all alerts received so far.
    #[must_use]
    pub fn get_notifications(&self) -> Vec<Alert> {
        self.notifications.lock().unwrap().clone()
    }

    /// Returns the number of alerts received.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    /// Clears the recorded alerts.
    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, alert: &Alert) {
        self.notifications.lock().unwrap().push(alert.clone());
    }
}
