//! Entry — a stored value together with its write bookkeeping.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::time::Timestamp;
use crate::value::Value;

/// A single fact in the session or settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
    pub last_update: Timestamp,
    pub write_count: u64,
    /// Quiet entries are kept in memory but never mirrored to external sinks.
    pub quiet: bool,
}

impl Entry {
    /// Create an entry for its first write.
    #[must_use]
    pub fn new(key: Key, value: Value, at: Timestamp, quiet: bool) -> Self {
        Self {
            key,
            value,
            last_update: at,
            write_count: 1,
            quiet,
        }
    }

    /// Create an entry restored from persisted state; it has not been
    /// written during this process's lifetime yet.
    #[must_use]
    pub fn restored(key: Key, value: Value, at: Timestamp) -> Self {
        Self {
            key,
            value,
            last_update: at,
            write_count: 0,
            quiet: false,
        }
    }

    /// Record a new write. Returns `true` when the value actually changed.
    ///
    /// The write count is bumped even when the value is unchanged.
    pub fn record(&mut self, value: Value, at: Timestamp, quiet: bool) -> bool {
        let changed = self.value != value;
        self.value = value;
        self.last_update = at;
        self.write_count += 1;
        self.quiet = quiet;
        changed
    }
}
