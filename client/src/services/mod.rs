//! Module for the components that do the work of a session.
//!
//! Each service is a thin façade over one collaborator: the tracker over the
//! position sensor, the sync channel over the realtime store, and the map
//! view over the map canvas. Connectivity holds the online flag.

pub mod connectivity;
pub mod map_view;
pub mod sync;
pub mod tracker;

pub use connectivity::{Connectivity, Transition};
pub use map_view::{MapView, MarkerChange};
pub use sync::SyncChannel;
pub use tracker::{FixRoute, PendingQueue, PendingUpdate, PositionTracker, TrackerState};
