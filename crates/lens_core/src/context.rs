//! Navigation context that survives restarts.

use crate::model::{DocumentId, DocumentType};

/// Where the user was last: shared between pages and restored at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationContext {
    pub last_search_text: Option<String>,
    pub last_search_type: Option<DocumentType>,
    /// Query string of the submissions table.
    pub last_submissions_query: Option<String>,
    pub last_document_id: Option<DocumentId>,
}

/// Load/save hooks for the navigation context. The driver owns the
/// implementation; the core only produces snapshots.
pub trait ContextStore {
    fn load(&self) -> NavigationContext;
    fn save(&self, context: &NavigationContext);
}

/// Store that keeps the context in memory only.
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    inner: std::sync::Mutex<NavigationContext>,
}

impl ContextStore for MemoryContextStore {
    fn load(&self) -> NavigationContext {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn save(&self, context: &NavigationContext) {
        *self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = context.clone();
    }
}
