//! Application-wide configuration.
//!
//! Layered with figment: built-in defaults, then an optional YAML file, then
//! `NETHELP_`-prefixed environment variables (`__` separates nested keys,
//! e.g. `NETHELP_MAP__ZOOM=12`). CLI overrides are applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adapters::{LatLng, MapOptions, TileLayer, WatchOptions};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "NETHELP_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapConfig,
    pub tracking: TrackingConfig,
    pub ui: UiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    /// Connectivity assumed before the first online/offline signal.
    pub start_online: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            tracking: TrackingConfig::default(),
            ui: UiConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            start_online: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial center when no recent position is cached.
    pub default_center: LatLng,
    pub zoom: u8,
    pub tile_layer: TileLayer,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng { lat: 0.0, lng: 0.0 },
            zoom: 15,
            tile_layer: TileLayer {
                url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png"
                    .to_owned(),
                attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_owned(),
                subdomains: "abcd".to_owned(),
                max_zoom: 20,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub high_accuracy: bool,
    pub fix_timeout_ms: u64,
    pub max_fix_age_ms: u64,
    /// Cached positions older than this are not used as the initial center.
    pub last_position_max_age_secs: i64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            fix_timeout_ms: 10_000,
            max_fix_age_ms: 0,
            last_position_max_age_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub notice_ttl_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_ttl_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file for local persistence; in-memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.tracking.high_accuracy,
            timeout: Duration::from_millis(self.tracking.fix_timeout_ms),
            maximum_age: Duration::from_millis(self.tracking.max_fix_age_ms),
        }
    }

    pub fn map_options(&self, center: LatLng) -> MapOptions {
        MapOptions {
            center,
            zoom: self.map.zoom,
            tile_layer: self.map.tile_layer.clone(),
        }
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.ui.notice_ttl_ms)
    }

    pub fn last_position_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.tracking.last_position_max_age_secs)
    }
}
