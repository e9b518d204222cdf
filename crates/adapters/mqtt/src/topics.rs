//! Topic layout and payloads.

use serde::Serialize;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::time::Timestamp;
use vehiclehub_domain::value::Value;

#[must_use]
pub fn session(base: &str, key: &str) -> String {
    format!("{}/session/{key}", base.trim_end_matches('/'))
}

#[must_use]
pub fn bus(base: &str) -> String {
    format!("{}/bus", base.trim_end_matches('/'))
}

#[must_use]
pub fn alert(base: &str) -> String {
    format!("{}/alert", base.trim_end_matches('/'))
}

#[must_use]
pub fn status(base: &str) -> String {
    format!("{}/status", base.trim_end_matches('/'))
}

/// Retained payload for a mirrored session entry.
#[derive(Debug, Serialize)]
pub struct SessionPayload<'a> {
    pub value: &'a Value,
    pub last_update: Timestamp,
}

impl<'a> From<&'a Entry> for SessionPayload<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            value: &entry.value,
            last_update: entry.last_update,
        }
    }
}
