//! The application: one owner for every component, one event at a time.
//!
//! [`App`] receives UI events from the front end, sensor readings from the
//! position watch and remote changes from the sync subscription. It handles
//! each one to completion before looking at the next.
//! Readings and remote changes arrive on channels the app owns; UI events are
//! passed in by the caller.

use std::sync::Arc;

use adapters::{
    Confirm, LocalStorage, MapCanvas, PositionFix, PositionSource, RealtimeStore, RemoteChange,
    SensorReading, UserId, UserRecord,
};
use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::auth::{Session, SessionController};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::errors::{AppError, SensorError};
use crate::services::{
    Connectivity, FixRoute, MapView, PositionTracker, SyncChannel, Transition,
};
use crate::storage::SessionStore;
use crate::ui::UiState;

/// Input coming from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Login(String),
    Logout,
    Online,
    Offline,
    Recenter,
    Shutdown,
}

/// Input produced by the app's own collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Reading(SensorReading),
    Remote(RemoteChange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The collaborators an [`App`] is built on.
pub struct Adapters {
    pub store: Arc<dyn RealtimeStore>,
    pub storage: Arc<dyn LocalStorage>,
    pub position_source: Box<dyn PositionSource>,
    pub canvas: Box<dyn MapCanvas>,
    pub confirm: Box<dyn Confirm>,
}

pub struct App {
    ctx: AppContext,
    session: SessionController,
    tracker: PositionTracker,
    sync: SyncChannel,
    map: MapView,
    connectivity: Connectivity,
    ui: UiState,
    readings_tx: UnboundedSender<SensorReading>,
    readings_rx: UnboundedReceiver<SensorReading>,
    changes_rx: UnboundedReceiver<RemoteChange>,
}

impl App {
    pub fn new(config: AppConfig, adapters: Adapters) -> Self {
        let ctx = AppContext::new(
            config,
            adapters.store,
            SessionStore::new(adapters.storage),
        );
        let (readings_tx, readings_rx) = mpsc::unbounded_channel();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();

        let mut tracker = PositionTracker::new(&ctx, adapters.position_source);
        if let Some(cached) = ctx.storage.load_last_position() {
            if cached.is_fresh(Utc::now(), ctx.config.last_position_max_age()) {
                tracing::debug!(position = %cached.position(), "using cached position as fallback center");
                tracker.seed_last_known(cached.position());
            }
        }

        Self {
            session: SessionController::new(ctx.storage.clone(), adapters.confirm),
            tracker,
            sync: SyncChannel::new(&ctx, changes_tx),
            map: MapView::new(&ctx, adapters.canvas),
            connectivity: Connectivity::new(ctx.config.start_online),
            ui: UiState::new(ctx.config.notice_ttl()),
            readings_tx,
            readings_rx,
            changes_rx,
            ctx,
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn sync(&self) -> &SyncChannel {
        &self.sync
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.current()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub async fn handle_ui(&mut self, event: UiEvent) -> Flow {
        match event {
            UiEvent::Login(name) => {
                self.ui.set_name_field(&name);
                if let Err(err) = self.login(&name).await {
                    tracing::info!(error = %err, "login rejected");
                    self.ui.show_notice(err.to_string());
                }
            }
            UiEvent::Logout => {
                self.logout().await;
            }
            UiEvent::Online => self.go_online().await,
            UiEvent::Offline => self.go_offline(),
            UiEvent::Recenter => {
                self.map.recenter_on_self(self.tracker.last_known());
            }
            UiEvent::Shutdown => {
                self.shutdown().await;
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Validates the name and starts a session: map, presence, subscription
    /// and position watch.
    pub async fn login(&mut self, name: &str) -> Result<UserId, AppError> {
        if let Some(active) = self.session.current() {
            tracing::warn!(user_id = %active.user_id, "login ignored, session already active");
            return Ok(active.user_id.clone());
        }
        let session = self.session.login(name)?;
        self.ui.enter_map(session.user_name.as_str());

        let center = self
            .tracker
            .last_known()
            .unwrap_or(self.ctx.config.map.default_center);
        if let Err(err) = self.map.init(center) {
            tracing::error!(error = %err, "failed to create map");
        }
        self.map.set_local_user(Some(session.user_id.clone()));

        if let Err(err) = self.sync.register_disconnect_cleanup(&session.user_id).await {
            tracing::error!(error = %err, "failed to register disconnect cleanup");
        }
        if let Err(err) = self.sync.subscribe().await {
            tracing::error!(error = %err, "failed to subscribe to users");
        }

        if let Err(err) = self.tracker.start(self.readings_tx.clone()) {
            self.ui.show_notice(err.to_string());
        }
        Ok(session.user_id)
    }

    /// Ends the session after confirmation. Returns whether it ended.
    pub async fn logout(&mut self) -> bool {
        if !self.session.confirm_logout() {
            return false;
        }
        let Some(user_id) = self.session.current().map(|s| s.user_id.clone()) else {
            return false;
        };

        self.tracker.stop();
        self.sync.settle().await;
        if let Err(err) = self.sync.unsubscribe_all().await {
            tracing::error!(error = %err, "failed to unsubscribe");
        }
        if let Err(err) = self.sync.remove_self(&user_id).await {
            tracing::error!(%user_id, error = %err, "failed to remove local user record");
        }

        self.map.clear();
        self.map.set_local_user(None);
        self.session.end();
        self.tracker.reset();
        self.ui.reset_to_login();
        self.discard_queued();
        true
    }

    /// Drops readings and remote changes that arrived for the ended session.
    fn discard_queued(&mut self) {
        let mut discarded = 0;
        while self.readings_rx.try_recv().is_ok() {
            discarded += 1;
        }
        while self.changes_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(discarded, "dropped events queued before logout");
        }
    }

    pub fn handle_reading(&mut self, reading: SensorReading) {
        match reading {
            Ok(fix) => self.handle_fix(&fix),
            Err(code) => {
                let err = SensorError::from(code);
                tracing::warn!(?code, "position sensor error");
                self.ui.show_notice(err.to_string());
            }
        }
    }

    fn handle_fix(&mut self, fix: &PositionFix) {
        let Some(session) = self.session.current().cloned() else {
            tracing::debug!("fix ignored, no active session");
            return;
        };

        match self.tracker.accept_fix(fix, self.connectivity.is_online()) {
            FixRoute::Publish(position) => {
                self.sync
                    .publish(&session.user_id, session.user_name.as_str(), position);
            }
            FixRoute::Queued => {}
        }

        let first_fix = !self.map.has_marker(&session.user_id);
        match self
            .map
            .upsert_marker(&session.user_id, session.user_name.as_str(), fix.coords)
        {
            Ok(_) if first_fix => {
                self.map.recenter_on_self(self.tracker.last_known());
            }
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "failed to draw own marker"),
        }
    }

    pub async fn handle_remote(&mut self, change: RemoteChange) {
        let Some(local) = self.session.current().map(|s| s.user_id.clone()) else {
            tracing::debug!(user_id = %change.id(), "remote change ignored, no active session");
            return;
        };

        match change {
            RemoteChange::Added { id, record } => {
                if id != local {
                    self.show_peer(&id, &record);
                }
                self.refresh_roster(&local).await;
            }
            RemoteChange::Changed { id, record } => {
                if id != local {
                    self.show_peer(&id, &record);
                }
            }
            RemoteChange::Removed { id } => {
                self.map.remove_marker(&id);
                self.refresh_roster(&local).await;
            }
        }
    }

    fn show_peer(&mut self, id: &UserId, record: &UserRecord) {
        let position = record.position();
        if !position.is_valid() {
            tracing::warn!(user_id = %id, %position, "skipping peer with invalid coordinates");
            return;
        }
        if let Err(err) = self.map.upsert_marker(id, &record.name, position) {
            tracing::error!(user_id = %id, error = %err, "failed to draw peer marker");
        }
    }

    async fn refresh_roster(&mut self, local: &UserId) {
        match self.sync.roster().await {
            Ok(users) => self.ui.roster.render(&users, Some(local)),
            Err(err) => tracing::warn!(error = %err, "roster refresh failed, keeping previous list"),
        }
    }

    async fn go_online(&mut self) {
        if self.connectivity.set_online(true) != Some(Transition::WentOnline) {
            return;
        }
        self.ui.set_offline_banner(false);

        let Some(session) = self.session.current().cloned() else {
            return;
        };
        // The backend spent the previous cleanup when the connection dropped.
        if let Err(err) = self.sync.register_disconnect_cleanup(&session.user_id).await {
            tracing::error!(error = %err, "failed to re-register disconnect cleanup");
        }
        if let Some(latest) = self.tracker.take_pending() {
            self.sync.publish(
                &session.user_id,
                session.user_name.as_str(),
                latest.position,
            );
        }
        if let Err(err) = self.sync.subscribe().await {
            tracing::error!(error = %err, "failed to resubscribe after reconnect");
        }
    }

    fn go_offline(&mut self) {
        if self.connectivity.set_online(false) == Some(Transition::WentOffline) {
            self.ui.set_offline_banner(true);
        }
    }

    /// Best-effort cleanup when the application goes away without a logout.
    /// The backend's disconnect cleanup covers whatever this misses.
    pub async fn shutdown(&mut self) {
        self.tracker.stop();
        let Some(user_id) = self.session.current().map(|s| s.user_id.clone()) else {
            return;
        };
        self.sync.settle().await;
        if let Err(err) = self.sync.remove_self(&user_id).await {
            tracing::warn!(%user_id, error = %err, "could not remove record on shutdown");
        }
    }

    /// Waits for the next reading or remote change. Cancel safe: nothing is
    /// lost if the future is dropped before it resolves.
    pub async fn next_incoming(&mut self) -> Incoming {
        tokio::select! {
            Some(reading) = self.readings_rx.recv() => Incoming::Reading(reading),
            Some(change) = self.changes_rx.recv() => Incoming::Remote(change),
        }
    }

    pub async fn handle_incoming(&mut self, incoming: Incoming) {
        match incoming {
            Incoming::Reading(reading) => self.handle_reading(reading),
            Incoming::Remote(change) => self.handle_remote(change).await,
        }
    }

    /// Handles everything already queued, waiting for in-flight writes and
    /// the notifications they cause, until nothing is left. Returns the
    /// number of events handled.
    pub async fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let before = handled;
            while let Ok(reading) = self.readings_rx.try_recv() {
                self.handle_reading(reading);
                handled += 1;
            }
            while let Ok(change) = self.changes_rx.try_recv() {
                self.handle_remote(change).await;
                handled += 1;
            }
            if self.sync.in_flight() == 0 && handled == before {
                return handled;
            }
            self.sync.settle().await;
        }
    }
}
