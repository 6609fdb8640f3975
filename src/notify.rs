//! Transient user-facing notifications (the toasts of the web client).

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self { Self { level: NoticeLevel::Success, message: message.into() } }
    pub fn error(message: impl Into<String>) -> Self { Self { level: NoticeLevel::Error, message: message.into() } }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sends notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(target: "notice", "{}", notice.message),
            NoticeLevel::Error => warn!(target: "notice", "{}", notice.message),
        }
    }
}

/// Most notices kept between drains; older ones are dropped first.
pub const MAX_NOTICES: usize = 64;

/// Queues notices until the front end drains and shows them.
#[derive(Debug)]
pub struct RecordingNotifier {
    queue: Mutex<VecDeque<Notice>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self { Self { queue: Mutex::new(VecDeque::with_capacity(MAX_NOTICES)) } }
}

impl RecordingNotifier {
    pub fn new() -> Self { Self::default() }

    pub fn drain(&self) -> Vec<Notice> { self.queue.lock().drain(..).collect() }

    pub fn last(&self) -> Option<Notice> { self.queue.lock().back().cloned() }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        TracingNotifier.notify(notice.clone());
        let mut queue = self.queue.lock();
        if queue.len() == MAX_NOTICES {
            queue.pop_front();
        }
        queue.push_back(notice);
    }
}
