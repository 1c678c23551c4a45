//! Shapes of the values kept in local storage.
//!
//! Field names follow the persisted JSON (`userId`, `userName`, ...) so an
//! existing store stays readable.

use adapters::{LatLng, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user_id: UserId,
    pub user_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedPosition {
    pub lat: f64,
    pub lng: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PersistedPosition {
    pub fn new(position: LatLng, at: DateTime<Utc>) -> Self {
        Self {
            lat: position.lat,
            lng: position.lng,
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Whether the cached fix is younger than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.timestamp_millis() - self.timestamp < max_age.num_milliseconds()
    }
}
