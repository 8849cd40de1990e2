use std::sync::Arc;

use crate::database::{MemoryStore, Store};

/// Shared handler state; cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self { store: Arc::new(store) }
    }

    /// Fresh, empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}
