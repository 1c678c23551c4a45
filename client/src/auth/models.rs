//! Data structures for the local session.

use std::fmt;

use adapters::UserId;
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Shortest accepted display name, in characters after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// A trimmed, validated display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if trimmed.chars().count() < MIN_NAME_CHARS {
            return Err(ValidationError::NameTooShort {
                min: MIN_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub user_name: DisplayName,
}
