//! The two tables: live session facts and persisted settings.

mod session;
mod settings;
mod table;

use serde::Serialize;

pub use session::{FrameReport, SessionStore};
pub use settings::SettingsStore;

/// How a write is propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Keep the entry out of external mirrors.
    pub quiet: bool,
    /// Forward the change to the state mirror when the value changed.
    pub publish: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            quiet: false,
            publish: true,
        }
    }
}

impl SetOptions {
    /// Local-only write: hooks still fire, nothing is mirrored.
    #[must_use]
    pub fn local() -> Self {
        Self {
            quiet: false,
            publish: false,
        }
    }

    #[must_use]
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            publish: true,
        }
    }
}

/// Counters exposed by `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub total_writes: u64,
    pub hooks_registered: usize,
    pub hooks_fired: u64,
    pub hook_failures: u64,
}
