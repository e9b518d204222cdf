//! [`SettingsPersistence`] backed by a JSON file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use vehiclehub_app::ports::persistence::{SettingsDocument, SettingsPersistence};
use vehiclehub_domain::error::HubError;

use crate::error::SettingsFileError;

/// Settings file on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<SettingsDocument, SettingsFileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no settings file, starting empty");
                return Ok(SettingsDocument::new());
            }
            Err(source) => {
                return Err(SettingsFileError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(SettingsDocument::new());
        }
        serde_json::from_str(&raw).map_err(|source| SettingsFileError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, document: &SettingsDocument) -> Result<(), SettingsFileError> {
        let json = serde_json::to_string_pretty(document)?;
        let write_err = |source| SettingsFileError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(write_err)?;
        fs::rename(&temp, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), components = document.len(), "settings saved");
        Ok(())
    }
}

impl SettingsPersistence for JsonSettingsFile {
    fn load(&self) -> Result<SettingsDocument, HubError> {
        Ok(self.read()?)
    }

    fn save(&self, document: &SettingsDocument) -> Result<(), HubError> {
        Ok(self.write(document)?)
    }
}
