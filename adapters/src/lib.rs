//! Core `adapters` crate for abstracting the collaborators of the location board.
//!
//! This crate defines one trait per system the application talks to: the
//! realtime store, local key-value storage, the position sensor, the map
//! canvas and a confirmation dialog. Each one has an in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

pub mod canvas;
pub mod dialog;
pub mod errors;
pub mod geolocation;
pub mod memory;
pub mod models;
pub mod storage;

pub use canvas::RecordingCanvas;
pub use dialog::ScriptedConfirm;
pub use errors::AdapterError;
pub use geolocation::{ChannelPositionSource, PositionFeed};
pub use memory::{MemoryConnection, MemoryRealtimeHub};
pub use models::*;
pub use storage::{FileStorage, MemoryStorage};

/// Realtime key-value store holding one record per participant under `users/`.
///
/// Writes resolve once the backend has accepted them. Notifications for a
/// subscription are pushed into the sink handed to [`RealtimeStore::subscribe_users`].
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Merges `update` into `users/<id>` and stamps `lastUpdated` server-side.
    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<(), AdapterError>;

    async fn remove_user(&self, id: &UserId) -> Result<(), AdapterError>;

    /// One-shot read of the whole collection.
    async fn fetch_users(&self) -> Result<BTreeMap<UserId, UserRecord>, AdapterError>;

    /// Registers added/changed/removed notifications. Existing records are
    /// reported as added before any live change.
    async fn subscribe_users(
        &self,
        sink: UnboundedSender<RemoteChange>,
    ) -> Result<SubscriptionId, AdapterError>;

    /// Drops every subscription registered through this handle.
    async fn unsubscribe_all(&self) -> Result<(), AdapterError>;

    /// Asks the backend to delete `users/<id>` if this client goes away
    /// without removing it.
    async fn remove_on_disconnect(&self, id: &UserId) -> Result<(), AdapterError>;
}

/// Synchronous string key-value storage that survives restarts.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AdapterError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AdapterError>;
    fn remove_item(&self, key: &str) -> Result<(), AdapterError>;
}

/// Continuous position stream of the device.
pub trait PositionSource: Send {
    /// Starts delivering readings into `sink` until the watch is cleared.
    fn watch(
        &mut self,
        options: &WatchOptions,
        sink: UnboundedSender<SensorReading>,
    ) -> Result<WatchId, AdapterError>;

    fn clear_watch(&mut self, id: WatchId);
}

/// Map widget that draws markers over a tile layer.
pub trait MapCanvas: Send {
    fn create(&mut self, options: &MapOptions) -> Result<(), AdapterError>;
    fn add_marker(&mut self, at: LatLng, style: &MarkerStyle) -> Result<MarkerHandle, AdapterError>;
    fn move_marker(&mut self, marker: MarkerHandle, at: LatLng) -> Result<(), AdapterError>;
    fn remove_marker(&mut self, marker: MarkerHandle) -> Result<(), AdapterError>;
    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<(), AdapterError>;
}

/// Yes/no question put to the user before a destructive action.
pub trait Confirm: Send {
    fn confirm(&mut self, prompt: &str) -> bool;
}
