//! Bounded log of recent failures for health reporting.
//!
//! An [`ErrorLog`] is created once at startup and handed to whoever needs to
//! record or read failures (the fan-out worker, the API error middleware, the
//! health service). Clones share the same buffer. Once `capacity` entries are
//! held, the oldest entry is evicted on every new record.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    /// Subsystem that reported the failure (e.g. `"fanout"`, `"http"`).
    pub source: String,
    /// Human readable description.
    pub message: String,
    /// When the failure was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Shared, bounded ring buffer of [`ErrorEntry`] values.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    entries: Arc<Mutex<VecDeque<ErrorEntry>>>,
    capacity: usize,
}

impl ErrorLog {
    /// Create an empty log holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record a failure, evicting the oldest entry when full.
    pub fn record(&self, source: impl Into<String>, message: impl Into<String>) {
        let entry = ErrorEntry {
            source: source.into(),
            message: message.into(),
            recorded_at: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of the retained entries, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<ErrorEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().cloned().collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no failures are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(50)
    }
}
