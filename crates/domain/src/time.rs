//! Time and timestamp helpers.
//!
//! Entries are stamped in the process's configured timezone, expressed as a
//! fixed UTC offset resolved once (or refreshed) by the caller.

use chrono::{DateTime, FixedOffset, Offset as _, Utc};

/// Timestamp used for `last_update`, event times, etc.
pub type Timestamp = DateTime<FixedOffset>;

/// Return the current time in the given timezone.
#[must_use]
pub fn now(offset: FixedOffset) -> Timestamp {
    Utc::now().with_timezone(&offset)
}

/// Build a [`FixedOffset`] from seconds east of UTC, falling back to UTC when
/// the value is out of range.
#[must_use]
pub fn offset_from_seconds(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(utc)
}

/// The UTC offset.
#[must_use]
pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| Utc.fix())
}
