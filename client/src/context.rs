//! Shared handles given to each component at construction.

use std::sync::Arc;

use adapters::RealtimeStore;

use crate::config::AppConfig;
use crate::storage::SessionStore;

/// Read-mostly handles shared by the components of one [`crate::app::App`].
///
/// Mutable state is never kept here: each component owns its own.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RealtimeStore>,
    pub storage: SessionStore,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<dyn RealtimeStore>, storage: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
            storage,
        }
    }
}
