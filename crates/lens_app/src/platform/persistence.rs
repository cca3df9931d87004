use std::path::PathBuf;

use lens_core::{ContextStore, DocumentType, NavigationContext};
use lens_engine::AtomicFileWriter;
use lens_logging::{lens_debug, lens_error, lens_warn};
use serde::{Deserialize, Serialize};

const CONTEXT_FILENAME: &str = "navigation.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedContext {
    last_search_text: Option<String>,
    last_search_type: Option<String>,
    last_submissions_query: Option<String>,
    last_document_id: Option<String>,
}

impl From<&NavigationContext> for PersistedContext {
    fn from(context: &NavigationContext) -> Self {
        Self {
            last_search_text: context.last_search_text.clone(),
            last_search_type: context.last_search_type.map(|t| t.as_str().to_string()),
            last_submissions_query: context.last_submissions_query.clone(),
            last_document_id: context.last_document_id.clone(),
        }
    }
}

impl From<PersistedContext> for NavigationContext {
    fn from(saved: PersistedContext) -> Self {
        Self {
            last_search_text: saved.last_search_text,
            last_search_type: saved
                .last_search_type
                .and_then(|raw| raw.parse::<DocumentType>().ok()),
            last_submissions_query: saved.last_submissions_query,
            last_document_id: saved.last_document_id,
        }
    }
}

/// Navigation context kept as a `ron` file in the state directory.
pub struct RonContextStore {
    writer: AtomicFileWriter,
}

impl RonContextStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }
}

impl ContextStore for RonContextStore {
    fn load(&self) -> NavigationContext {
        let content = match self.writer.read(CONTEXT_FILENAME) {
            Ok(Some(text)) => text,
            Ok(None) => return NavigationContext::default(),
            Err(err) => {
                lens_warn!("Failed to read navigation context: {}", err);
                return NavigationContext::default();
            }
        };
        match ron::from_str::<PersistedContext>(&content) {
            Ok(saved) => {
                lens_debug!("Loaded navigation context from {:?}", self.writer.dir());
                saved.into()
            }
            Err(err) => {
                lens_warn!("Ignoring unreadable navigation context: {}", err);
                NavigationContext::default()
            }
        }
    }

    fn save(&self, context: &NavigationContext) {
        let saved = PersistedContext::from(context);
        let content = match ron::ser::to_string_pretty(&saved, ron::ser::PrettyConfig::new()) {
            Ok(text) => text,
            Err(err) => {
                lens_error!("Failed to serialize navigation context: {}", err);
                return;
            }
        };
        if let Err(err) = self.writer.write(CONTEXT_FILENAME, content.as_bytes()) {
            lens_error!(
                "Failed to write navigation context to {:?}: {}",
                self.writer.dir(),
                err
            );
        }
    }
}
