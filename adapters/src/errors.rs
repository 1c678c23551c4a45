//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while talking to the realtime
//! store, local storage, the position sensor or the map canvas, giving every
//! adapter a single error type the application can log and drop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("not ready: {0}")]
    NotReady(&'static str),

    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("unknown marker #{0}")]
    UnknownMarker(u64),
}
