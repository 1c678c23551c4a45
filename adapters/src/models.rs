//! Generic data models for the `adapters` crate.
//!
//! These models are the shapes exchanged with every collaborator: user records
//! as the realtime store keeps them, position fixes from the sensor, and the
//! marker and map descriptions handed to the canvas.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;

/// Opaque identifier of a participant, the key under `users/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, AdapterError> {
        let candidate = Self { lat, lng };
        if candidate.is_valid() {
            Ok(candidate)
        } else {
            Err(AdapterError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// The value stored at `users/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Server-assigned, milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_updated: Option<i64>,
}

impl UserRecord {
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Merge payload for a user record; the store stamps `lastUpdated` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpdate {
    pub name: String,
    pub position: LatLng,
}

impl UserUpdate {
    pub fn new(name: impl Into<String>, position: LatLng) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Notification delivered to subscribers of the `users` collection.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteChange {
    Added { id: UserId, record: UserRecord },
    Changed { id: UserId, record: UserRecord },
    Removed { id: UserId },
}

impl RemoteChange {
    pub fn id(&self) -> &UserId {
        match self {
            Self::Added { id, .. } | Self::Changed { id, .. } | Self::Removed { id } => id,
        }
    }
}

/// One reading from the position sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coords: LatLng,
    /// Accuracy radius in meters, when the sensor reports one.
    pub accuracy: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn now(coords: LatLng) -> Self {
        Self {
            coords,
            accuracy: None,
            fetched_at: Utc::now(),
        }
    }
}

/// Failure codes reported by the position sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

pub type SensorReading = Result<PositionFix, SensorErrorCode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub label: String,
    pub fill_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub subdomains: String,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    pub tile_layer: TileLayer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LatLng::new(10.0, 20.0).is_ok());
        assert!(LatLng::new(90.5, 0.0).is_err());
        assert!(LatLng::new(0.0, -180.5).is_err());
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn user_record_uses_store_field_names() {
        let record = UserRecord {
            name: "Ana".to_owned(),
            lat: 1.5,
            lng: 2.5,
            last_updated: Some(42),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["lastUpdated"], 42);

        let parsed: UserRecord =
            serde_json::from_str(r#"{"name":"Luis","lat":10.0,"lng":20.0}"#).unwrap();
        assert_eq!(parsed.last_updated, None);
        assert_eq!(parsed.position(), LatLng { lat: 10.0, lng: 20.0 });
    }
}
