use std::path::PathBuf;

use vehiclehub_domain::error::HubError;

/// Errors raised while reading or writing the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsFileError {
    #[error("unable to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write settings file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not a valid document")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode settings document")]
    Encode(#[from] serde_json::Error),
}

impl From<SettingsFileError> for HubError {
    fn from(err: SettingsFileError) -> Self {
        Self::storage(err)
    }
}
