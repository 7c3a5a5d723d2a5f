//! The user-facing activity log.
//!
//! Every observable outcome of a sort or undo (a move, a deletion, a skipped
//! directory, a failure) is appended here as a [`LogEntry`]. Entries are never
//! mutated. Front-ends either read the whole list or subscribe to a channel
//! and receive entries as they are appended.

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

/// One immutable line of the activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Append-only log with optional live subscribers.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
    subscribers: Vec<Sender<LogEntry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an informational entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    /// Appends a warning entry.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::debug!(target: "quasar::activity", "{}", message),
            LogLevel::Warn => tracing::debug!(target: "quasar::activity", warn = true, "{}", message),
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message,
        };
        // Receivers that hung up are dropped.
        self.subscribers
            .retain(|subscriber| subscriber.send(entry.clone()).is_ok());
        self.entries.push(entry);
    }

    /// Returns a receiver that gets every entry appended from now on.
    pub fn subscribe(&mut self) -> Receiver<LogEntry> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries. Subscribers stay attached.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
