//! Transient confirmation messages shown after a user action.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    posted_at: Instant,
}

/// Holds at most one notice; a newer one replaces the old.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn post(&mut self, message: impl Into<String>) {
        self.post_at(message, Instant::now());
    }

    pub fn post_at(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!(%message, "notice posted");
        self.current = Some(Notice {
            message,
            posted_at: now,
        });
    }

    /// The live notice, if it has not yet expired.
    pub fn current(&self) -> Option<&str> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|notice| now.saturating_duration_since(notice.posted_at) < self.ttl)
            .map(|notice| notice.message.as_str())
    }
}
