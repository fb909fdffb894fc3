// Application state module
// Shared, read-only state handed to every connection task

use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::Config;
use crate::courses::CourseStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: CourseStore,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    /// Create `AppState` with the seeded course store
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: CourseStore::seeded(),
            active_connections: AtomicUsize::new(0),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
