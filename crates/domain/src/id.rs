//! Identifiers for queued commands, hooks, change events and history rows.
//!
//! Events and history rows get time-ordered (v7) ids so that sorting by id
//! follows the order they were produced in. The others are random.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident, $generate:path) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self($generate())
            }
        }

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Rebuild an id read back from storage.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Tags a serial command from the moment it is queued until its write
    /// is acknowledged or fails.
    MessageId,
    uuid::Uuid::new_v4
);

define_id!(
    /// Handle returned when a hook is registered, used to unregister it.
    HookId,
    uuid::Uuid::new_v4
);

define_id!(
    /// Id of a change [`Event`](crate::event::Event) sent to stream
    /// subscribers.
    EventId,
    uuid::Uuid::now_v7
);

define_id!(
    /// Key of one row in the session history.
    HistoryId,
    uuid::Uuid::now_v7
);
