use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use common::config::DEFAULT_LOG_CAPACITY;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.text)
    }
}

/// Bounded operational log, oldest first. Once full, every append evicts the
/// oldest line.
pub struct LogBuffer {
    tx: watch::Sender<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = watch::channel(VecDeque::with_capacity(capacity + 1));
        Self { tx, capacity }
    }

    /// Stamps `text` with the current local time and pushes it to the tail.
    pub fn append(&self, text: impl Into<String>) {
        let entry = LogEntry {
            at: Local::now(),
            text: text.into(),
        };
        info!(target: "dashboard_log", "{}", entry.text);

        let capacity = self.capacity;
        self.tx.send_modify(|entries| {
            entries.push_back(entry);
            while entries.len() > capacity {
                entries.pop_front();
            }
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.tx.borrow().iter().cloned().collect()
    }

    /// Formatted `[HH:MM:SS] text` lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.tx.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> watch::Receiver<VecDeque<LogEntry>> {
        self.tx.subscribe()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
