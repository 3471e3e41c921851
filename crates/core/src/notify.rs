//! User-facing notifications

use std::cell::RefCell;

/// Fire-and-forget delivery of a short notice to the user
pub trait NotificationGateway {
    fn notify(&self, title: &str, body: &str);
}

/// Sends notices to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationGateway for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "Notification");
    }
}

/// Keeps every notice in memory, oldest first
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl NotificationGateway for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
    }
}
