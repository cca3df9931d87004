use crate::failure::Failure;
use crate::model::{
    DocumentDetail, DocumentItem, DocumentStats, DocumentType, DuplicateCheckResult,
    SubmissionStatus,
};
use crate::pagination::{page_window, PageItem};
use crate::query::SearchQuery;
use crate::workflow::{RetryPhase, SubmitPhase};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub message: String,
    /// Show a "Try Again" control.
    pub retryable: bool,
}

impl From<&Failure> for ErrorView {
    fn from(failure: &Failure) -> Self {
        Self {
            message: failure.display_message(),
            retryable: failure.retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRowView {
    pub id: String,
    pub url: String,
    pub document_type: DocumentType,
    pub status: SubmissionStatus,
    pub document_id: Option<String>,
    pub error_message: Option<String>,
    pub is_duplicate: bool,
    pub created_at: String,
    pub retry: RetryPhase,
    pub retry_error: Option<String>,
    pub retry_document_id: Option<String>,
    /// Retry was refused until a document URL is entered.
    pub needs_document_url: bool,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateFlowView {
    pub phase: SubmitPhase,
    pub trace: Vec<SubmitPhase>,
    pub error: Option<ErrorView>,
    /// A matching document exists and the user has to decide.
    pub pending_duplicate: Option<DuplicateCheckResult>,
    pub result_document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentSearchView {
    pub items: Vec<DocumentItem>,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
    pub cold_start_notice: bool,
    pub error: Option<ErrorView>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailView {
    pub document_id: Option<String>,
    pub loading: bool,
    pub document: Option<DocumentDetail>,
    pub error: Option<ErrorView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsView {
    pub stats: DocumentStats,
    pub loading: bool,
    pub error: Option<ErrorView>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub signed_in_as: Option<String>,
    pub is_admin: bool,
    pub query: SearchQuery,
    pub query_string: String,
    pub submissions: Vec<SubmissionRowView>,
    pub total_submissions: u64,
    pub page_count: u32,
    pub pages: Vec<PageItem>,
    pub submissions_loading: bool,
    pub submissions_error: Option<ErrorView>,
    pub cold_start_notice: bool,
    pub create: CreateFlowView,
    pub documents: DocumentSearchView,
    pub detail: DetailView,
    pub stats: StatsView,
    pub busy: bool,
    pub dirty: bool,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let page = self.submissions.result.as_ref();
        let submissions = page
            .map(|page| {
                page.items
                    .iter()
                    .map(|record| {
                        let session = self.retries.session(&record.id);
                        let retry = self.retries.phase(&record.id);
                        SubmissionRowView {
                            id: record.id.clone(),
                            url: record.url.clone(),
                            document_type: record.document_type,
                            status: record.status,
                            document_id: record.document_id.clone(),
                            error_message: record.error_message.clone(),
                            is_duplicate: record.is_duplicate_success(),
                            created_at: record.created_at.clone(),
                            retry,
                            retry_error: session
                                .and_then(|s| s.error_message())
                                .map(str::to_string),
                            retry_document_id: session
                                .and_then(|s| s.result_document_id())
                                .map(str::to_string),
                            needs_document_url: self.retries.needs_document_url(&record.id),
                            can_retry: record.status == SubmissionStatus::Failed
                                && matches!(retry, RetryPhase::Idle | RetryPhase::Error),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        let page_count = page.map(|p| p.page_count).unwrap_or(0);

        AppViewModel {
            signed_in_as: self.user_email().map(str::to_string),
            is_admin: self.is_admin(),
            query: self.submissions.query.clone(),
            query_string: self.submissions.query.to_query_string(),
            submissions,
            total_submissions: page.map(|p| p.total).unwrap_or(0),
            page_count,
            pages: page_window(self.submissions.query.page, page_count),
            submissions_loading: self.submissions.in_flight.is_some(),
            submissions_error: self.submissions.error.as_ref().map(ErrorView::from),
            cold_start_notice: self.submissions.cold_start,
            create: CreateFlowView {
                phase: self.create.phase(),
                trace: self.create.trace().to_vec(),
                error: self.create.error().map(ErrorView::from),
                pending_duplicate: self.create.pending_duplicate().cloned(),
                result_document_id: self.create.record().and_then(|r| r.document_id.clone()),
            },
            documents: DocumentSearchView {
                items: self.documents.items.clone(),
                total: self.documents.total,
                has_more: self.documents.has_more(),
                loading: self.documents.in_flight.is_some(),
                cold_start_notice: self.documents.cold_start,
                error: self.documents.error.as_ref().map(ErrorView::from),
            },
            detail: DetailView {
                document_id: self.detail.document_id.clone(),
                loading: self.detail.in_flight,
                document: self.detail.document.clone(),
                error: self.detail.error.as_ref().map(ErrorView::from),
            },
            stats: StatsView {
                stats: self.stats.stats,
                loading: self.stats.loading,
                error: self.stats.error.as_ref().map(ErrorView::from),
            },
            busy: self.is_busy(),
            dirty: self.is_dirty(),
        }
    }
}
