use std::time::Duration;

use crate::context::NavigationContext;
use crate::model::{DocumentId, DocumentType, RetryRequest, SubmissionId, SubmissionRequest};
use crate::query::{DocumentQuery, SearchQuery};
use crate::workflow::FlowKey;
use crate::{Msg, RequestId};

/// How eagerly a cached submissions query should be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve from cache inside the deduping window.
    Cached,
    /// A view mounted; refresh if the mount policy asks for it.
    Mount,
    /// The window regained focus; refresh if the focus policy asks for it.
    Focus,
    /// Always hit the network (user asked to try again).
    Force,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// User-scoped submissions search through the query cache.
    FetchSubmissions {
        request_id: RequestId,
        query: SearchQuery,
        freshness: Freshness,
    },
    /// Unscoped search against the privileged endpoint, never cached.
    AdminSearchSubmissions {
        request_id: RequestId,
        query: SearchQuery,
    },
    SearchDocuments {
        request_id: RequestId,
        query: DocumentQuery,
    },
    FetchDocument {
        document_id: DocumentId,
        skip_view_increment: bool,
    },
    CancelDocumentFetch { document_id: DocumentId },
    FetchStats,
    CheckDuplicate {
        flow: FlowKey,
        url: String,
        document_type: DocumentType,
        user_email: String,
    },
    CreateSubmission(SubmissionRequest),
    RetrySubmission {
        submission_id: SubmissionId,
        request: RetryRequest,
    },
    /// Evict every cached submissions search.
    InvalidateSearches,
    /// Mirror the submissions query into the page URL.
    SyncQueryString(String),
    NavigateToDocument(DocumentId),
    PersistContext(NavigationContext),
    /// Deliver `msg` back to `update` after `after` has elapsed.
    Schedule { after: Duration, msg: Box<Msg> },
}
