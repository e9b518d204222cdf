//! # vehiclehub-adapter-settings-json
//!
//! Stores the settings table as a single JSON document on disk.
//!
//! The file is a flat object of objects (`{"component": {"field": value}}`)
//! and is rewritten in full on every save: the new document goes to a
//! sibling temporary file which is then renamed over the old one.

mod error;
mod file;

pub use error::SettingsFileError;
pub use file::JsonSettingsFile;
