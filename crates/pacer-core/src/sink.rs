//! Observability collaborator injected into the retry policy and rate limiter.
//!
//! The primitives only depend on the [`EventSink`] capability set; the
//! default [`TracingSink`] forwards to `tracing`.

use std::fmt;
use std::sync::Mutex;

/// Severity of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Receiver for attempt and token events.
pub trait EventSink: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards events to `tracing` under the `pacer` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "pacer", "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: "pacer", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "pacer", "{}", message);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: Level, message: &str) {
        self.lock().push((level, message.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Level, String)>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}
