use std::time::Duration;

use crate::context::NavigationContext;
use crate::failure::Failure;
use crate::model::{
    DocumentDetail, DocumentId, DocumentItem, DocumentStats, DocumentType, PaginatedResult,
    SubmissionRecord, UserIdentity,
};
use crate::query::{DocumentQuery, SearchQuery};
use crate::workflow::{CreateFlow, RetryBoard};
use crate::RequestId;

/// Delays that drive the timed parts of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTimings {
    /// How long a successful retry stays on screen.
    pub success_reset: Duration,
    /// How long a failed retry stays on screen.
    pub error_reset: Duration,
    /// Pending time after which the slow-backend notice appears.
    pub cold_start_notice: Duration,
    pub search_debounce: Duration,
}

impl Default for WorkflowTimings {
    fn default() -> Self {
        Self {
            success_reset: Duration::from_millis(1500),
            error_reset: Duration::from_secs(3),
            cold_start_notice: Duration::from_secs(3),
            search_debounce: Duration::from_millis(300),
        }
    }
}

/// The submissions table.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SubmissionsState {
    pub(crate) query: SearchQuery,
    pub(crate) page_open: bool,
    pub(crate) text_revision: u64,
    pub(crate) result: Option<PaginatedResult<SubmissionRecord>>,
    pub(crate) in_flight: Option<RequestId>,
    pub(crate) error: Option<Failure>,
    pub(crate) cold_start: bool,
    /// The query belongs to an internal lookup and is not remembered.
    pub(crate) lookup: bool,
}

/// The public document search with load-more.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct DocumentSearchState {
    /// Last page that was loaded successfully.
    pub(crate) loaded: Option<DocumentQuery>,
    /// Last page that was asked for, loaded or not.
    pub(crate) requested: Option<DocumentQuery>,
    pub(crate) items: Vec<DocumentItem>,
    pub(crate) total: u64,
    pub(crate) page_count: u32,
    pub(crate) in_flight: Option<RequestId>,
    pub(crate) error: Option<Failure>,
    pub(crate) cold_start: bool,
}

impl DocumentSearchState {
    pub(crate) fn has_more(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|query| query.page < self.page_count)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct DetailState {
    pub(crate) document_id: Option<DocumentId>,
    pub(crate) skip_view_increment: bool,
    pub(crate) in_flight: bool,
    pub(crate) document: Option<DocumentDetail>,
    pub(crate) error: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct StatsState {
    pub(crate) stats: DocumentStats,
    pub(crate) loading: bool,
    pub(crate) error: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) identity: Option<UserIdentity>,
    pub(crate) timings: WorkflowTimings,
    pub(crate) next_request_id: RequestId,
    pub(crate) submissions: SubmissionsState,
    pub(crate) create: CreateFlow,
    pub(crate) retries: RetryBoard,
    pub(crate) documents: DocumentSearchState,
    pub(crate) detail: DetailState,
    pub(crate) stats: StatsState,
    pub(crate) navigation: NavigationContext,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timings(timings: WorkflowTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn timings(&self) -> WorkflowTimings {
        self.timings
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(|user| user.is_admin)
    }

    pub fn user_email(&self) -> Option<&str> {
        self.identity.as_ref().map(|user| user.email.as_str())
    }

    pub fn query(&self) -> &SearchQuery {
        &self.submissions.query
    }

    pub fn create_flow(&self) -> &CreateFlow {
        &self.create
    }

    pub fn retries(&self) -> &RetryBoard {
        &self.retries
    }

    /// Snapshot for the context store.
    pub fn navigation_snapshot(&self) -> NavigationContext {
        self.navigation.clone()
    }

    pub fn find_submission(&self, id: &str) -> Option<&SubmissionRecord> {
        self.submissions
            .result
            .as_ref()
            .and_then(|page| page.items.iter().find(|record| record.id == id))
    }

    /// True while any request or workflow step is outstanding.
    pub fn is_busy(&self) -> bool {
        self.submissions.in_flight.is_some()
            || self.documents.in_flight.is_some()
            || self.detail.in_flight
            || self.stats.loading
            || self.create.is_running()
            || self.retries.any_running()
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Replace a listed record with the server's latest copy.
    pub(crate) fn replace_submission(&mut self, record: SubmissionRecord) {
        if let Some(page) = self.submissions.result.as_mut() {
            if let Some(slot) = page.items.iter_mut().find(|item| item.id == record.id) {
                *slot = record;
            }
        }
    }

    pub(crate) fn remember_document_search(
        &mut self,
        text: &str,
        document_type: Option<DocumentType>,
    ) -> bool {
        let text = Some(text.to_string());
        if self.navigation.last_search_text == text
            && self.navigation.last_search_type == document_type
        {
            return false;
        }
        self.navigation.last_search_text = text;
        self.navigation.last_search_type = document_type;
        true
    }

    pub(crate) fn remember_submissions_query(&mut self) -> bool {
        if self.submissions.lookup {
            return false;
        }
        let encoded = self.submissions.query.to_query_string();
        let encoded = (!encoded.is_empty()).then_some(encoded);
        if self.navigation.last_submissions_query == encoded {
            return false;
        }
        self.navigation.last_submissions_query = encoded;
        true
    }

    pub(crate) fn remember_document(&mut self, document_id: &str) -> bool {
        if self.navigation.last_document_id.as_deref() == Some(document_id) {
            return false;
        }
        self.navigation.last_document_id = Some(document_id.to_string());
        true
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is needed and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
