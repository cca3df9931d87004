use std::sync::Arc;

use lens_core::{
    DocumentDetail, DocumentId, DocumentItem, DocumentQuery, DocumentStats, DocumentType,
    DuplicateCheckResult, FlowKey, Freshness, PaginatedResult, RequestId, RetryRequest,
    SearchQuery, SubmissionId, SubmissionRecord, SubmissionRequest,
};

use crate::{ApiError, CachePolicy, NoRetry, RetryStrategy};

/// Work the engine performs on its runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SearchSubmissions {
        request_id: RequestId,
        query: SearchQuery,
        freshness: Freshness,
    },
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
    CancelDocument {
        document_id: DocumentId,
    },
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
    /// Drop every cached submissions search.
    InvalidateSearches,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SubmissionsLoaded {
        request_id: RequestId,
        result: Result<PaginatedResult<SubmissionRecord>, ApiError>,
    },
    DocumentsLoaded {
        request_id: RequestId,
        result: Result<PaginatedResult<DocumentItem>, ApiError>,
    },
    DocumentLoaded {
        document_id: DocumentId,
        result: Result<DocumentDetail, ApiError>,
    },
    StatsLoaded(Result<DocumentStats, ApiError>),
    DuplicateChecked {
        flow: FlowKey,
        result: DuplicateCheckResult,
    },
    SubmissionCreated(Result<SubmissionRecord, ApiError>),
    RetryFinished {
        submission_id: SubmissionId,
        result: Result<SubmissionRecord, ApiError>,
    },
}

#[derive(Clone)]
pub struct EngineSettings {
    pub cache_policy: CachePolicy,
    /// Applied to reads only.
    pub retry: Arc<dyn RetryStrategy>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::default(),
            retry: Arc::new(NoRetry),
        }
    }
}

impl std::fmt::Debug for EngineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSettings")
            .field("cache_policy", &self.cache_policy)
            .finish_non_exhaustive()
    }
}
