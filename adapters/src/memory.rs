//! In-memory realtime store.
//!
//! A [`MemoryRealtimeHub`] plays the backend: it keeps the `users` collection,
//! fans out change notifications and honours remove-on-disconnect requests.
//! Each client talks to it through its own [`MemoryConnection`], and dropping
//! a connection with [`MemoryConnection::disconnect`] behaves like a crashed
//! tab: its pending cleanups run and its subscriptions vanish.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;

use crate::errors::AdapterError;
use crate::models::{RemoteChange, SubscriptionId, UserId, UserRecord, UserUpdate};
use crate::RealtimeStore;

struct Subscriber {
    id: SubscriptionId,
    connection: u64,
    sink: UnboundedSender<RemoteChange>,
}

#[derive(Default)]
struct HubState {
    users: BTreeMap<UserId, UserRecord>,
    subscribers: Vec<Subscriber>,
    on_disconnect: HashMap<u64, BTreeSet<UserId>>,
    unreachable: bool,
    next_id: u64,
}

impl HubState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn broadcast(&mut self, change: &RemoteChange) {
        self.subscribers
            .retain(|subscriber| subscriber.sink.send(change.clone()).is_ok());
    }

    fn delete(&mut self, id: &UserId) {
        if self.users.remove(id).is_some() {
            self.broadcast(&RemoteChange::Removed { id: id.clone() });
        }
    }

    fn ensure_reachable(&self) -> Result<(), AdapterError> {
        if self.unreachable {
            Err(AdapterError::Transport("backend unreachable".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryRealtimeHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryRealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new client connection to the hub.
    pub fn connect(&self) -> MemoryConnection {
        let id = self.lock().next_id();
        tracing::debug!(connection = id, "memory hub connection opened");
        MemoryConnection {
            hub: self.clone(),
            id,
        }
    }

    /// Makes every operation fail with a transport error while `false`.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
    }

    pub fn users(&self) -> BTreeMap<UserId, UserRecord> {
        self.lock().users.clone()
    }

    pub fn user(&self, id: &UserId) -> Option<UserRecord> {
        self.lock().users.get(id).cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One client's view of a [`MemoryRealtimeHub`].
pub struct MemoryConnection {
    hub: MemoryRealtimeHub,
    id: u64,
}

impl MemoryConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Simulates an ungraceful disconnect: registered cleanups run on the
    /// hub and this connection's subscriptions are dropped.
    pub fn disconnect(&self) {
        let mut state = self.hub.lock();
        state
            .subscribers
            .retain(|subscriber| subscriber.connection != self.id);
        let pending = state.on_disconnect.remove(&self.id).unwrap_or_default();
        tracing::debug!(
            connection = self.id,
            cleanups = pending.len(),
            "memory hub connection lost"
        );
        for id in &pending {
            state.delete(id);
        }
    }
}

#[async_trait]
impl RealtimeStore for MemoryConnection {
    async fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<(), AdapterError> {
        let mut state = self.hub.lock();
        state.ensure_reachable()?;

        let record = UserRecord {
            name: update.name,
            lat: update.position.lat,
            lng: update.position.lng,
            last_updated: Some(Utc::now().timestamp_millis()),
        };
        let change = if state.users.insert(id.clone(), record.clone()).is_some() {
            RemoteChange::Changed {
                id: id.clone(),
                record,
            }
        } else {
            RemoteChange::Added {
                id: id.clone(),
                record,
            }
        };
        state.broadcast(&change);
        Ok(())
    }

    async fn remove_user(&self, id: &UserId) -> Result<(), AdapterError> {
        let mut state = self.hub.lock();
        state.ensure_reachable()?;
        state.delete(id);
        Ok(())
    }

    async fn fetch_users(&self) -> Result<BTreeMap<UserId, UserRecord>, AdapterError> {
        let state = self.hub.lock();
        state.ensure_reachable()?;
        Ok(state.users.clone())
    }

    async fn subscribe_users(
        &self,
        sink: UnboundedSender<RemoteChange>,
    ) -> Result<SubscriptionId, AdapterError> {
        let mut state = self.hub.lock();
        state.ensure_reachable()?;

        for (id, record) in &state.users {
            let replay = RemoteChange::Added {
                id: id.clone(),
                record: record.clone(),
            };
            if sink.send(replay).is_err() {
                return Err(AdapterError::Transport("subscriber sink closed".to_owned()));
            }
        }

        let id = SubscriptionId(state.next_id());
        state.subscribers.push(Subscriber {
            id,
            connection: self.id,
            sink,
        });
        Ok(id)
    }

    async fn unsubscribe_all(&self) -> Result<(), AdapterError> {
        let mut state = self.hub.lock();
        let before = state.subscribers.len();
        state
            .subscribers
            .retain(|subscriber| subscriber.connection != self.id);
        tracing::debug!(
            connection = self.id,
            dropped = before - state.subscribers.len(),
            "memory hub subscriptions dropped"
        );
        Ok(())
    }

    async fn remove_on_disconnect(&self, id: &UserId) -> Result<(), AdapterError> {
        let mut state = self.hub.lock();
        state.ensure_reachable()?;
        state
            .on_disconnect
            .entry(self.id)
            .or_default()
            .insert(id.clone());
        Ok(())
    }
}
