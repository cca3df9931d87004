#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use lens_core::{
    DocumentDetail, DocumentItem, DocumentQuery, DocumentStats, DocumentType, PaginatedResult,
    RetryRequest, SearchQuery, SubmissionRecord, SubmissionRequest, SubmissionStatus,
};
use lens_engine::{ApiClient, ApiError, DocumentFetchOptions};
use tokio_util::sync::CancellationToken;

/// In-memory service double that records what it was asked.
#[derive(Default)]
pub struct FakeApi {
    pub records: Mutex<Vec<SubmissionRecord>>,
    pub fail_searches: AtomicBool,
    pub search_calls: AtomicUsize,
    pub admin_calls: AtomicUsize,
    pub last_query: Mutex<Option<SearchQuery>>,
    pub search_delay: Option<Duration>,
    pub detail_delay: Option<Duration>,
}

impl FakeApi {
    pub fn with_records(records: Vec<SubmissionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query.lock().unwrap().clone()
    }

    fn page(&self, query: &SearchQuery) -> PaginatedResult<SubmissionRecord> {
        let items = self.records.lock().unwrap().clone();
        PaginatedResult {
            total: items.len() as u64,
            page: query.page,
            page_size: query.page_size,
            page_count: 1,
            items,
            error_flag: false,
            error_message: None,
        }
    }
}

pub fn record(id: &str, url: &str, status: SubmissionStatus, document_id: Option<&str>) -> SubmissionRecord {
    SubmissionRecord {
        id: id.into(),
        url: url.into(),
        document_type: DocumentType::Tos,
        document_url: None,
        status,
        created_at: "2024-05-01T10:00:00Z".into(),
        updated_at: "2024-05-01T10:00:00Z".into(),
        document_id: document_id.map(str::to_string),
        user_email: "ana@example.com".into(),
        error_message: None,
        duplicate: None,
    }
}

pub fn detail(id: &str) -> DocumentDetail {
    DocumentDetail {
        id: id.into(),
        url: "https://example.com/terms".into(),
        document_type: DocumentType::Tos,
        company_name: Some("Example".into()),
        retrieved_url: None,
        one_sentence_summary: None,
        hundred_word_summary: None,
        scores: Vec::new(),
        key_points: Vec::new(),
        views: 0,
        created_at: None,
        updated_at: None,
    }
}

#[async_trait::async_trait]
impl ApiClient for FakeApi {
    async fn create_submission(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, ApiError> {
        let mut created = record("new", &request.url, SubmissionStatus::Initialized, None);
        created.document_type = request.document_type;
        Ok(created)
    }

    async fn retry_submission(
        &self,
        submission_id: &str,
        _request: &RetryRequest,
    ) -> Result<SubmissionRecord, ApiError> {
        Ok(record(submission_id, "https://example.com", SubmissionStatus::Processing, None))
    }

    async fn search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(self.page(query))
    }

    async fn admin_search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError> {
        self.admin_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page(query))
    }

    async fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<PaginatedResult<DocumentItem>, ApiError> {
        Ok(PaginatedResult::empty(query.page_size))
    }

    async fn get_document_by_id(
        &self,
        document_id: &str,
        _options: DocumentFetchOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentDetail, ApiError> {
        let delay = self.detail_delay.unwrap_or_default();
        tokio::select! {
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(detail(document_id)),
        }
    }

    async fn get_document_stats(&self) -> Result<DocumentStats, ApiError> {
        Ok(DocumentStats {
            tos_count: 3,
            pp_count: 2,
            total_count: 5,
        })
    }
}
