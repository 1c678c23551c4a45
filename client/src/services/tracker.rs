//! Position tracking: the device watch, the last known fix and the offline
//! buffer.
//!
//! The tracker decides where an accepted fix goes: straight to the sync
//! channel while online, into the [`PendingQueue`] while offline. Every fix is
//! cached in local storage as the next start's fallback center.

use adapters::{LatLng, PositionFix, PositionSource, SensorReading, WatchId, WatchOptions};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

use crate::context::AppContext;
use crate::errors::SensorError;
use crate::storage::{PersistedPosition, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Stopped,
    Watching(WatchId),
}

/// Where an accepted fix has to go next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixRoute {
    Publish(LatLng),
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingUpdate {
    pub position: LatLng,
    pub timestamp: DateTime<Utc>,
}

/// Fixes gathered while offline, oldest first.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<PendingUpdate>,
}

impl PendingQueue {
    pub fn push(&mut self, update: PendingUpdate) {
        self.entries.push(update);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the queue and returns only its newest entry; older entries
    /// are discarded.
    pub fn take_latest(&mut self) -> Option<PendingUpdate> {
        let latest = self.entries.pop();
        if !self.entries.is_empty() {
            tracing::debug!(
                discarded = self.entries.len(),
                "dropping superseded offline fixes"
            );
        }
        self.entries.clear();
        latest
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct PositionTracker {
    source: Box<dyn PositionSource>,
    options: WatchOptions,
    storage: SessionStore,
    state: TrackerState,
    pending: PendingQueue,
    last_known: Option<LatLng>,
}

impl PositionTracker {
    pub fn new(ctx: &AppContext, source: Box<dyn PositionSource>) -> Self {
        Self {
            source,
            options: ctx.config.watch_options(),
            storage: ctx.storage.clone(),
            state: TrackerState::Stopped,
            pending: PendingQueue::default(),
            last_known: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn last_known(&self) -> Option<LatLng> {
        self.last_known
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Seeds the last known position from a cached fix.
    pub fn seed_last_known(&mut self, position: LatLng) {
        self.last_known = Some(position);
    }

    /// Starts watching the device position. A second call while watching
    /// keeps the existing watch.
    pub fn start(&mut self, sink: UnboundedSender<SensorReading>) -> Result<(), SensorError> {
        if let TrackerState::Watching(id) = self.state {
            tracing::debug!(watch = id.0, "position watch already active");
            return Ok(());
        }
        match self.source.watch(&self.options, sink) {
            Ok(id) => {
                tracing::info!(watch = id.0, "position watch started");
                self.state = TrackerState::Watching(id);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "position watch unavailable");
                Err(SensorError::Unsupported)
            }
        }
    }

    pub fn stop(&mut self) {
        if let TrackerState::Watching(id) = self.state {
            self.source.clear_watch(id);
            self.state = TrackerState::Stopped;
            tracing::info!(watch = id.0, "position watch stopped");
        }
    }

    /// Records a fix and tells the caller whether to publish it now.
    pub fn accept_fix(&mut self, fix: &PositionFix, online: bool) -> FixRoute {
        self.last_known = Some(fix.coords);
        self.storage
            .save_last_position(&PersistedPosition::new(fix.coords, fix.fetched_at));

        if online {
            FixRoute::Publish(fix.coords)
        } else {
            self.pending.push(PendingUpdate {
                position: fix.coords,
                timestamp: fix.fetched_at,
            });
            tracing::debug!(queued = self.pending.len(), "offline, fix queued");
            FixRoute::Queued
        }
    }

    pub fn take_pending(&mut self) -> Option<PendingUpdate> {
        self.pending.take_latest()
    }

    /// Forgets the last known position and any queued fixes.
    pub fn reset(&mut self) {
        self.last_known = None;
        self.pending.clear();
    }
}
