use std::collections::VecDeque;
use std::sync::Mutex;

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Destructive,
}

/// A dismissable user-facing message: short title plus optional detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Destructive
    }
}

/// Most notifications held at once; the oldest are dropped beyond this.
pub const MAX_PENDING: usize = 100;

/// Queue of notifications waiting to be shown by the front end.
///
/// Everything pushed here is also written to the log. Front ends should
/// [`drain`](Notifications::drain) it after each action; anything not drained
/// is kept up to [`MAX_PENDING`] entries.
#[derive(Debug, Default)]
pub struct Notifications {
    queue: Mutex<VecDeque<Notification>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Notification {
            title: title.into(),
            description: Some(description.into()),
            severity: Severity::Info,
        });
    }

    pub fn notice(&self, title: impl Into<String>) {
        self.push(Notification {
            title: title.into(),
            description: None,
            severity: Severity::Info,
        });
    }

    pub fn failure(&self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Notification {
            title: title.into(),
            description: Some(description.into()),
            severity: Severity::Destructive,
        });
    }

    pub fn push(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!(
                "{}: {}",
                notification.title,
                notification.description.as_deref().unwrap_or("")
            ),
            Severity::Destructive => warn!(
                "{}: {}",
                notification.title,
                notification.description.as_deref().unwrap_or("")
            ),
        }
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_PENDING {
            queue.pop_front();
        }
        queue.push_back(notification);
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).back().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
