//! Channel-fed position source.
//!
//! [`ChannelPositionSource`] stands in for the device sensor: readings pushed
//! through its [`PositionFeed`] are forwarded to every active watch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::errors::AdapterError;
use crate::models::{LatLng, PositionFix, SensorErrorCode, SensorReading, WatchId, WatchOptions};
use crate::PositionSource;

#[derive(Default)]
struct Watches {
    active: HashMap<WatchId, UnboundedSender<SensorReading>>,
    last_options: Option<WatchOptions>,
    next_id: u64,
}

type SharedWatches = Arc<Mutex<Watches>>;

fn lock(watches: &SharedWatches) -> MutexGuard<'_, Watches> {
    watches.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ChannelPositionSource {
    watches: SharedWatches,
    supported: bool,
}

impl ChannelPositionSource {
    pub fn new() -> Self {
        Self {
            watches: SharedWatches::default(),
            supported: true,
        }
    }

    /// A source for a device without geolocation support.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn feed(&self) -> PositionFeed {
        PositionFeed {
            watches: Arc::clone(&self.watches),
        }
    }
}

impl Default for ChannelPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for ChannelPositionSource {
    fn watch(
        &mut self,
        options: &WatchOptions,
        sink: UnboundedSender<SensorReading>,
    ) -> Result<WatchId, AdapterError> {
        if !self.supported {
            return Err(AdapterError::Unsupported("geolocation"));
        }
        let mut watches = lock(&self.watches);
        watches.next_id += 1;
        let id = WatchId(watches.next_id);
        watches.active.insert(id, sink);
        watches.last_options = Some(*options);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        lock(&self.watches).active.remove(&id);
    }
}

/// Handle that injects readings into a [`ChannelPositionSource`].
#[derive(Clone)]
pub struct PositionFeed {
    watches: SharedWatches,
}

impl PositionFeed {
    /// Delivers a fix stamped with the current time. Returns how many
    /// watches received it.
    pub fn push_fix(&self, coords: LatLng) -> usize {
        self.push(Ok(PositionFix::now(coords)))
    }

    pub fn push_error(&self, code: SensorErrorCode) -> usize {
        self.push(Err(code))
    }

    pub fn push(&self, reading: SensorReading) -> usize {
        let mut watches = lock(&self.watches);
        watches
            .active
            .retain(|_, sink| sink.send(reading).is_ok());
        watches.active.len()
    }

    pub fn active_watches(&self) -> usize {
        lock(&self.watches).active.len()
    }

    /// Options passed to the most recent `watch` call.
    pub fn last_options(&self) -> Option<WatchOptions> {
        lock(&self.watches).last_options
    }
}
