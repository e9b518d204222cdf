//! Event — an immutable record of a change to one of the tables.
//!
//! Events feed live consumers (the SSE stream); they are not persisted.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::id::EventId;
use crate::time::Timestamp;
use crate::value::Value;

/// What kind of change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionChanged,
    SettingChanged,
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// `KEY` for session changes, `COMPONENT.FIELD` for settings.
    pub key: String,
    pub value: Value,
    pub write_count: u64,
    pub timestamp: Timestamp,
}

impl Event {
    /// Build an event describing the given entry.
    #[must_use]
    pub fn from_entry(event_type: EventType, key: String, entry: &Entry) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            key,
            value: entry.value.clone(),
            write_count: entry.write_count,
            timestamp: entry.last_update,
        }
    }
}
