//! Errors raised when a display name cannot start a session.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your name.")]
    EmptyName,

    #[error("Your name must be at least {min} characters long.")]
    NameTooShort { min: usize },
}
