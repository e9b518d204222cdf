//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` (or an explicit `From` impl for boxed sources).

/// Top-level error shared by the application layer and its ports.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An external collaborator (serial device, MQTT broker, bus bridge)
    /// rejected or failed the request.
    #[error("device error")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HubError {
    /// Wrap any error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }

    /// Wrap any error as a device failure.
    pub fn device(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Device(err.into())
    }
}

/// A request was rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid name {0:?}: only letters, digits, underscores and spaces are allowed")]
    InvalidName(String),

    #[error("value for {key} must be a scalar (bool, number or string)")]
    UnsupportedValue { key: String },

    #[error("invalid power target {0:?}: expected AUTO, ON or OFF")]
    InvalidPowerTarget(String),

    #[error("frame is not a JSON object")]
    InvalidFrame,
}

/// A lookup did not find anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
