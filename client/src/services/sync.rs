//! Sync channel: the façade over the realtime store.
//!
//! Publishing is fire-and-forget. Each write runs as its own task in a
//! [`JoinSet`]; a failed write is logged and dropped without retry. The set
//! lets logout wait for writes still in flight so a late position update
//! cannot recreate a record that was just removed.

use std::collections::BTreeMap;
use std::sync::Arc;

use adapters::{
    AdapterError, LatLng, RealtimeStore, RemoteChange, SubscriptionId, UserId, UserRecord,
    UserUpdate,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use crate::context::AppContext;

pub struct SyncChannel {
    store: Arc<dyn RealtimeStore>,
    changes: UnboundedSender<RemoteChange>,
    subscription: Option<SubscriptionId>,
    writes: JoinSet<()>,
}

impl SyncChannel {
    /// Remote changes are delivered into `changes` once subscribed.
    pub fn new(ctx: &AppContext, changes: UnboundedSender<RemoteChange>) -> Self {
        Self {
            store: Arc::clone(&ctx.store),
            changes,
            subscription: None,
            writes: JoinSet::new(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.writes.len()
    }

    /// Upserts the local user's record in the background.
    pub fn publish(&mut self, user_id: &UserId, name: &str, position: LatLng) {
        while self.writes.try_join_next().is_some() {}

        let store = Arc::clone(&self.store);
        let user_id = user_id.clone();
        let update = UserUpdate::new(name, position);
        self.writes.spawn(async move {
            match store.update_user(&user_id, update).await {
                Ok(()) => tracing::trace!(%user_id, %position, "position published"),
                Err(err) => tracing::error!(%user_id, error = %err, "failed to publish position"),
            }
        });
    }

    /// Waits for every publish still in flight.
    pub async fn settle(&mut self) {
        while let Some(result) = self.writes.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "position write task did not complete");
            }
        }
    }

    /// Subscribes to the `users` collection, replacing any earlier
    /// subscription so notifications are never delivered twice.
    pub async fn subscribe(&mut self) -> Result<(), AdapterError> {
        if self.subscription.is_some() {
            self.unsubscribe_all().await?;
        }
        let id = self.store.subscribe_users(self.changes.clone()).await?;
        tracing::debug!(subscription = id.0, "subscribed to users");
        self.subscription = Some(id);
        Ok(())
    }

    pub async fn register_disconnect_cleanup(&self, user_id: &UserId) -> Result<(), AdapterError> {
        self.store.remove_on_disconnect(user_id).await?;
        tracing::debug!(%user_id, "disconnect cleanup registered");
        Ok(())
    }

    pub async fn unsubscribe_all(&mut self) -> Result<(), AdapterError> {
        self.store.unsubscribe_all().await?;
        self.subscription = None;
        Ok(())
    }

    pub async fn remove_self(&self, user_id: &UserId) -> Result<(), AdapterError> {
        self.store.remove_user(user_id).await?;
        tracing::info!(%user_id, "local user record removed");
        Ok(())
    }

    /// One-shot read of every participant.
    pub async fn roster(&self) -> Result<BTreeMap<UserId, UserRecord>, AdapterError> {
        self.store.fetch_users().await
    }
}
