/*
[INPUT]:  User-facing messages from auth and session flows
[OUTPUT]: Toast-style notifications delivered to the front end
[POS]:    App layer - notification seam
[UPDATE]: When adding notification levels or sinks
*/

use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Sink for toast notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str);
}

/// Writes notifications to the tracing log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Success | ToastLevel::Info => info!(toast = message),
            ToastLevel::Warning => warn!(toast = message),
            ToastLevel::Error => error!(toast = message),
        }
    }
}

/// Keeps every notification in memory, for assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(ToastLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<(ToastLevel, String)> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<(ToastLevel, String)> {
        self.toasts().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
