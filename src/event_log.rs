//! Event log — best-effort in-memory record of module status messages.
//!
//! DESIGN
//! ======
//! Every module (api, offline, data, queues) appends status and error
//! messages here so an embedding UI can surface them. Each entry is also
//! emitted through `tracing`, so nothing depends on the in-memory copy.
//! The buffer is bounded; the oldest entries fall off first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 512;

/// Severity of a logged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A single logged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub source: &'static str,
    pub level: Level,
    pub message: String,
}

/// Shared, cloneable handle to a bounded log buffer.
#[derive(Clone)]
pub struct EventLog {
    source: &'static str,
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl EventLog {
    #[must_use]
    pub fn new(source: &'static str) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(source: &'static str, capacity: usize) -> Self {
        Self { source, entries: Arc::new(Mutex::new(VecDeque::new())), capacity: capacity.max(1) }
    }

    /// A handle writing into the same buffer under a different source name.
    #[must_use]
    pub fn scoped(&self, source: &'static str) -> Self {
        Self { source, entries: Arc::clone(&self.entries), capacity: self.capacity }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(source = self.source, "{message}");
        self.push(Level::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(source = self.source, "{message}");
        self.push(Level::Error, message);
    }

    /// Snapshot of the buffered entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// `true` if any buffered message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }

    fn push(&self, level: Level, message: String) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry { source: self.source, level, message });
    }
}

#[cfg(test)]
#[path = "event_log_test.rs"]
mod tests;
