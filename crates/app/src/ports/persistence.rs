//! Settings persistence port.
//!
//! The whole settings table is written on every change, so the port deals in
//! complete documents rather than individual keys.

use std::collections::BTreeMap;

use vehiclehub_domain::error::HubError;
use vehiclehub_domain::value::Value;

/// `component -> field -> value`, the on-disk shape of the settings table.
pub type SettingsDocument = BTreeMap<String, BTreeMap<String, Value>>;

/// Loads and saves the settings document.
///
/// Calls block. The settings store runs saves on the blocking pool and
/// acknowledges a write only once the document has been flushed.
pub trait SettingsPersistence: Send + Sync {
    /// Read the persisted document. A missing store yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the store exists but cannot be read
    /// or decoded.
    fn load(&self) -> Result<SettingsDocument, HubError>;

    /// Replace the persisted document.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the document cannot be written.
    fn save(&self, document: &SettingsDocument) -> Result<(), HubError>;
}

/// Keeps nothing; used when settings persistence is disabled.
impl SettingsPersistence for () {
    fn load(&self) -> Result<SettingsDocument, HubError> {
        Ok(SettingsDocument::new())
    }

    fn save(&self, _document: &SettingsDocument) -> Result<(), HubError> {
        Ok(())
    }
}

impl<T: SettingsPersistence> SettingsPersistence for std::sync::Arc<T> {
    fn load(&self) -> Result<SettingsDocument, HubError> {
        (**self).load()
    }

    fn save(&self, document: &SettingsDocument) -> Result<(), HubError> {
        (**self).save(document)
    }
}
