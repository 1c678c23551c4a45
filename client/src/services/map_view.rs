//! Map view: one marker per participant on the map canvas.
//!
//! The marker table lives here and nowhere else. Canvas failures are logged;
//! the table only changes when the canvas accepted the command.

use std::collections::HashMap;

use adapters::{AdapterError, LatLng, MapCanvas, MarkerHandle, MarkerStyle, UserId};

use crate::context::AppContext;

pub const SELF_COLOR: &str = "#00d4aa";
pub const PEER_COLOR: &str = "#1a4d7a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerChange {
    Created,
    Moved,
}

#[derive(Debug, Clone)]
struct MarkerEntry {
    handle: MarkerHandle,
    position: LatLng,
}

pub struct MapView {
    ctx: AppContext,
    canvas: Box<dyn MapCanvas>,
    initialized: bool,
    local_user: Option<UserId>,
    markers: HashMap<UserId, MarkerEntry>,
}

impl MapView {
    pub fn new(ctx: &AppContext, canvas: Box<dyn MapCanvas>) -> Self {
        Self {
            ctx: ctx.clone(),
            canvas,
            initialized: false,
            local_user: None,
            markers: HashMap::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Creates the map at `center` with the configured zoom and tile layer.
    /// Later calls leave the existing map in place.
    pub fn init(&mut self, center: LatLng) -> Result<(), AdapterError> {
        if self.initialized {
            return Ok(());
        }
        self.canvas.create(&self.ctx.config.map_options(center))?;
        self.initialized = true;
        tracing::debug!(%center, zoom = self.ctx.config.map.zoom, "map created");
        Ok(())
    }

    /// Sets whose marker gets the "self" color.
    pub fn set_local_user(&mut self, user_id: Option<UserId>) {
        self.local_user = user_id;
    }

    pub fn upsert_marker(
        &mut self,
        user_id: &UserId,
        name: &str,
        position: LatLng,
    ) -> Result<MarkerChange, AdapterError> {
        if let Some(entry) = self.markers.get_mut(user_id) {
            self.canvas.move_marker(entry.handle, position)?;
            entry.position = position;
            return Ok(MarkerChange::Moved);
        }

        let fill_color = if self.local_user.as_ref() == Some(user_id) {
            SELF_COLOR
        } else {
            PEER_COLOR
        };
        let style = MarkerStyle {
            label: name.to_owned(),
            fill_color: fill_color.to_owned(),
        };
        let handle = self.canvas.add_marker(position, &style)?;
        self.markers
            .insert(user_id.clone(), MarkerEntry { handle, position });
        Ok(MarkerChange::Created)
    }

    /// Returns whether a marker was removed.
    pub fn remove_marker(&mut self, user_id: &UserId) -> bool {
        let Some(entry) = self.markers.remove(user_id) else {
            return false;
        };
        if let Err(err) = self.canvas.remove_marker(entry.handle) {
            tracing::warn!(%user_id, error = %err, "canvas failed to remove marker");
        }
        true
    }

    pub fn clear(&mut self) {
        let ids: Vec<UserId> = self.markers.keys().cloned().collect();
        for id in &ids {
            self.remove_marker(id);
        }
    }

    /// Centers the viewport on `position` at the configured zoom. No-op
    /// without a position.
    pub fn recenter_on_self(&mut self, position: Option<LatLng>) -> bool {
        let Some(center) = position else {
            return false;
        };
        match self.canvas.set_view(center, self.ctx.config.map.zoom) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "canvas failed to recenter");
                false
            }
        }
    }

    pub fn has_marker(&self, user_id: &UserId) -> bool {
        self.markers.contains_key(user_id)
    }

    pub fn marker_position(&self, user_id: &UserId) -> Option<LatLng> {
        self.markers.get(user_id).map(|entry| entry.position)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}
