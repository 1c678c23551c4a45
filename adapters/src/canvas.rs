//! Recording map canvas.
//!
//! Keeps the markers and viewport a real map widget would draw so callers can
//! inspect them. Clones share the same drawing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::AdapterError;
use crate::models::{LatLng, MapOptions, MarkerHandle, MarkerStyle};
use crate::MapCanvas;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnMarker {
    pub handle: MarkerHandle,
    pub position: LatLng,
    pub style: MarkerStyle,
}

#[derive(Default)]
struct Drawing {
    options: Option<MapOptions>,
    markers: BTreeMap<MarkerHandle, DrawnMarker>,
    view: Option<(LatLng, u8)>,
    next_handle: u64,
}

#[derive(Clone, Default)]
pub struct RecordingCanvas {
    drawing: Arc<Mutex<Drawing>>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_created(&self) -> bool {
        self.lock().options.is_some()
    }

    pub fn options(&self) -> Option<MapOptions> {
        self.lock().options.clone()
    }

    pub fn markers(&self) -> Vec<DrawnMarker> {
        self.lock().markers.values().cloned().collect()
    }

    pub fn marker_labelled(&self, label: &str) -> Option<DrawnMarker> {
        self.lock()
            .markers
            .values()
            .find(|marker| marker.style.label == label)
            .cloned()
    }

    /// Current center and zoom.
    pub fn view(&self) -> Option<(LatLng, u8)> {
        self.lock().view
    }

    fn lock(&self) -> MutexGuard<'_, Drawing> {
        self.drawing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn created(&self) -> Result<MutexGuard<'_, Drawing>, AdapterError> {
        let drawing = self.lock();
        if drawing.options.is_none() {
            return Err(AdapterError::NotReady("map canvas not created"));
        }
        Ok(drawing)
    }
}

impl MapCanvas for RecordingCanvas {
    fn create(&mut self, options: &MapOptions) -> Result<(), AdapterError> {
        let mut drawing = self.lock();
        drawing.view = Some((options.center, options.zoom));
        drawing.options = Some(options.clone());
        Ok(())
    }

    fn add_marker(&mut self, at: LatLng, style: &MarkerStyle) -> Result<MarkerHandle, AdapterError> {
        let mut drawing = self.created()?;
        drawing.next_handle += 1;
        let handle = MarkerHandle(drawing.next_handle);
        drawing.markers.insert(
            handle,
            DrawnMarker {
                handle,
                position: at,
                style: style.clone(),
            },
        );
        Ok(handle)
    }

    fn move_marker(&mut self, marker: MarkerHandle, at: LatLng) -> Result<(), AdapterError> {
        let mut drawing = self.created()?;
        let drawn = drawing
            .markers
            .get_mut(&marker)
            .ok_or(AdapterError::UnknownMarker(marker.0))?;
        drawn.position = at;
        Ok(())
    }

    fn remove_marker(&mut self, marker: MarkerHandle) -> Result<(), AdapterError> {
        self.created()?.markers.remove(&marker);
        Ok(())
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<(), AdapterError> {
        self.created()?.view = Some((center, zoom));
        Ok(())
    }
}
