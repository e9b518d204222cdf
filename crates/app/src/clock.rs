//! Process-wide clock carrying the configured timezone offset.

use chrono::FixedOffset;
use parking_lot::RwLock;

use vehiclehub_domain::time::{Timestamp, now, utc};

/// Produces timestamps in the hub's configured timezone.
///
/// The offset can be changed at runtime (e.g. after a GPS fix); later
/// timestamps pick up the new offset, earlier ones keep theirs.
#[derive(Debug)]
pub struct Clock {
    offset: RwLock<FixedOffset>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(utc())
    }
}

impl Clock {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset: RwLock::new(offset),
        }
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        now(*self.offset.read())
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        *self.offset.read()
    }

    pub fn set_offset(&self, offset: FixedOffset) {
        *self.offset.write() = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehiclehub_domain::time::offset_from_seconds;

    #[test]
    fn should_stamp_with_updated_offset() {
        let clock = Clock::default();
        assert_eq!(clock.now().offset().local_minus_utc(), 0);

        clock.set_offset(offset_from_seconds(7200));
        assert_eq!(clock.now().offset().local_minus_utc(), 7200);
    }
}
