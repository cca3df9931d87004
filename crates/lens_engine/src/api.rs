use lens_core::{
    DocumentDetail, DocumentItem, DocumentQuery, DocumentStats, PaginatedResult, RetryRequest,
    SearchQuery, SubmissionRecord, SubmissionRequest,
};
use lens_logging::{lens_debug, lens_info, lens_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ApiConfig, API_KEY_HEADER};
use crate::wire::{
    CreateSubmissionBody, DocumentSearchBody, RetryBody, SubmissionSearchBody, WireDocumentDetail,
    WireDocumentItem, WireErrorBody, WirePage, WireStats, WireSubmission,
};
use crate::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentFetchOptions {
    /// Ask the server not to count this read as a view.
    pub skip_view_increment: bool,
}

/// Typed operations of the document service.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn create_submission(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, ApiError>;

    async fn retry_submission(
        &self,
        submission_id: &str,
        request: &RetryRequest,
    ) -> Result<SubmissionRecord, ApiError>;

    /// Submissions of one user. `query.user_email` is mandatory.
    async fn search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError>;

    /// Submissions across all users.
    async fn admin_search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError>;

    async fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<PaginatedResult<DocumentItem>, ApiError>;

    /// Resolves to [`ApiError::Cancelled`] as soon as `cancel` fires.
    async fn get_document_by_id(
        &self,
        document_id: &str,
        options: DocumentFetchOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentDetail, ApiError>;

    async fn get_document_stats(&self) -> Result<DocumentStats, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ReqwestApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Result<(Url, &str), ApiError> {
        let (base_url, api_key) = self.config.credentials()?;
        let mut url = Url::parse(base_url)
            .map_err(|err| ApiError::Configuration(format!("invalid base URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Configuration("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok((url, api_key))
    }

    async fn send<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let (mut url, api_key) = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let path = url.path().to_string();
        lens_debug!("{method} {path}");

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|err| ApiError::Validation(format!("unserializable request: {err}")))?;
            request = request.header(CONTENT_TYPE, "application/json").body(payload);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        lens_info!("{method} {path} -> {}", status.as_u16());

        if !status.is_success() {
            let message = serde_json::from_slice::<WireErrorBody>(&bytes)
                .ok()
                .and_then(WireErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            lens_warn!("{method} {path} failed with {}: {message}", status.as_u16());
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::decode(err.to_string()))
    }

    async fn post_page<B, W, T>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<PaginatedResult<T>, ApiError>
    where
        B: Serialize + Sync,
        W: DeserializeOwned,
        T: TryFrom<W, Error = ApiError>,
    {
        let page: WirePage<W> = self
            .send(Method::POST, segments, &[], Some(body))
            .await?;
        page.into_result()
    }
}

#[async_trait::async_trait]
impl ApiClient for ReqwestApiClient {
    async fn create_submission(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, ApiError> {
        let body = CreateSubmissionBody::from(request);
        let wire: WireSubmission = self
            .send(Method::POST, &["api", "v1", "submissions"], &[], Some(&body))
            .await?;
        SubmissionRecord::try_from(wire)
    }

    async fn retry_submission(
        &self,
        submission_id: &str,
        request: &RetryRequest,
    ) -> Result<SubmissionRecord, ApiError> {
        let body = RetryBody::from(request);
        let wire: WireSubmission = self
            .send(
                Method::POST,
                &["api", "v1", "submissions", submission_id, "retry"],
                &[],
                Some(&body),
            )
            .await?;
        SubmissionRecord::try_from(wire)
    }

    async fn search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError> {
        if query.user_email.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::Validation(
                "user email is required to search submissions".into(),
            ));
        }
        let body = SubmissionSearchBody::from(query);
        self.post_page::<_, WireSubmission, _>(&["api", "v1", "submissions", "search"], &body)
            .await
    }

    async fn admin_search_submissions(
        &self,
        query: &SearchQuery,
    ) -> Result<PaginatedResult<SubmissionRecord>, ApiError> {
        let body = SubmissionSearchBody::from(query);
        self.post_page::<_, WireSubmission, _>(
            &["api", "v1", "admin", "submissions", "search"],
            &body,
        )
        .await
    }

    async fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<PaginatedResult<DocumentItem>, ApiError> {
        let body = DocumentSearchBody::from(query);
        self.post_page::<_, WireDocumentItem, _>(&["api", "v1", "documents", "search"], &body)
            .await
    }

    async fn get_document_by_id(
        &self,
        document_id: &str,
        options: DocumentFetchOptions,
        cancel: &CancellationToken,
    ) -> Result<DocumentDetail, ApiError> {
        let query: &[(&str, &str)] = if options.skip_view_increment {
            &[("skip_view_increment", "true")]
        } else {
            &[]
        };
        let segments = ["api", "v1", "documents", document_id];
        let fetch = self.send::<(), WireDocumentDetail>(
            Method::GET,
            &segments,
            query,
            None,
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                lens_debug!("document {document_id} fetch cancelled");
                Err(ApiError::Cancelled)
            }
            result = fetch => DocumentDetail::try_from(result?),
        }
    }

    async fn get_document_stats(&self) -> Result<DocumentStats, ApiError> {
        let wire: WireStats = self
            .send::<(), _>(Method::GET, &["api", "v1", "documents", "stats"], &[], None)
            .await?;
        Ok(wire.into())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Transport(format!("request timed out: {err}"));
    }
    if err.is_decode() {
        return ApiError::decode(err.to_string());
    }
    ApiError::Transport(err.to_string())
}
