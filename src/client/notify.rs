use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible toast.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Shared sink the UI drains to display toasts.
#[derive(Clone, Default)]
pub struct Notices {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    fn push(&self, level: NoticeLevel, message: String) {
        tracing::debug!(?level, %message, "notice");
        self.queue.lock().unwrap().push(Notice { level, message });
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock().unwrap())
    }

    pub fn last(&self) -> Option<Notice> {
        self.queue.lock().unwrap().last().cloned()
    }
}
