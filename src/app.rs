// Application state shared across handlers
use std::sync::Arc;

use crate::services::draft_library::DraftLibrary;
use crate::store::EntityStore;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub drafts: DraftLibrary,
}

impl<S: EntityStore> AppState<S> {
    pub fn new(store: S, drafts: DraftLibrary) -> Self {
        Self {
            store: Arc::new(store),
            drafts,
        }
    }
}

// Manual impl: `S` itself need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            drafts: self.drafts.clone(),
        }
    }
}
