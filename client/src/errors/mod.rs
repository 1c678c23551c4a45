//! Global application error types.
//!
//! Validation errors block a login, sensor errors become a transient notice,
//! and adapter errors are logged and dropped. Nothing here is fatal to a
//! running session.

use adapters::{AdapterError, SensorErrorCode};
use thiserror::Error;

pub use crate::auth::errors::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sensor(#[from] SensorError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Position sensor failures, worded for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("Location permission denied. Please enable it in your device settings.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("Timed out while getting your location.")]
    Timeout,

    #[error("Could not get your location.")]
    Other,

    #[error("Geolocation is not supported on this device.")]
    Unsupported,
}

impl From<SensorErrorCode> for SensorError {
    fn from(code: SensorErrorCode) -> Self {
        match code {
            SensorErrorCode::PermissionDenied => Self::PermissionDenied,
            SensorErrorCode::PositionUnavailable => Self::PositionUnavailable,
            SensorErrorCode::Timeout => Self::Timeout,
            SensorErrorCode::Unknown => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_codes_map_to_distinct_messages() {
        let messages: Vec<String> = [
            SensorErrorCode::PermissionDenied,
            SensorErrorCode::PositionUnavailable,
            SensorErrorCode::Timeout,
            SensorErrorCode::Unknown,
        ]
        .into_iter()
        .map(|code| SensorError::from(code).to_string())
        .collect();

        for (i, message) in messages.iter().enumerate() {
            assert!(!message.is_empty());
            assert!(!messages[i + 1..].contains(message));
        }
        assert_eq!(
            SensorError::from(SensorErrorCode::Unknown),
            SensorError::Other
        );
    }
}
