//! Key — the canonical name of a session fact or setting.
//!
//! Keys are case-insensitive on input. Canonicalization trims the input,
//! replaces spaces with underscores and upper-cases the result; the canonical
//! form must then consist of ASCII letters, digits and underscores only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated, canonicalized key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Canonicalize and validate a raw key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for blank input and
    /// [`ValidationError::InvalidName`] when a character outside
    /// `[A-Za-z0-9_ ]` is present.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let canonical: String = trimmed
            .chars()
            .map(|c| if c == ' ' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        if !canonical
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ValidationError::InvalidName(raw.to_string()));
        }
        Ok(Self(canonical))
    }

    /// The canonical (upper-case) form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lower-cased form used to match hooks.
    #[must_use]
    pub fn hook_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Key {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
