use std::time::Duration;

use lens_core::{
    DocumentQuery, DocumentType, RetryRequest, SearchQuery, SortOrder, SubmissionRequest,
    SubmissionStatus,
};
use lens_engine::{ApiClient, ApiConfig, ApiError, DocumentFetchOptions, ReqwestApiClient};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestApiClient {
    ReqwestApiClient::new(ApiConfig {
        base_url: Some(format!("{}/", server.uri())),
        api_key: Some("test-key".into()),
        ..ApiConfig::default()
    })
    .unwrap()
}

fn submission(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "url": "https://example.com",
        "document_type": "tos",
        "status": status,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:05:00Z",
        "document_id": "d1",
        "user_email": "ana@example.com"
    })
}

#[tokio::test]
async fn search_submissions_posts_query_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions/search"))
        .and(header("X-API-Key", "test-key"))
        .and(body_json(json!({
            "search_text": "example",
            "status": "success",
            "user_email": "ana@example.com",
            "page": 2,
            "per_page": 5,
            "sort_order": "asc"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [submission("s1", "success")],
            "total": 6, "page": 2, "per_page": 5, "pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = SearchQuery {
        text: " example ".into(),
        status: Some(SubmissionStatus::Success),
        user_email: Some("ana@example.com".into()),
        page: 2,
        page_size: 5,
        sort_order: SortOrder::Asc,
        ..SearchQuery::default()
    };
    let page = client_for(&server).search_submissions(&query).await.unwrap();

    assert_eq!(page.total, 6);
    assert_eq!(page.page_count, 2);
    assert!(!page.has_more());
    assert_eq!(page.items[0].id, "s1");
    assert_eq!(page.items[0].status, SubmissionStatus::Success);
}

#[tokio::test]
async fn search_submissions_without_email_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .search_submissions(&SearchQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn admin_search_uses_admin_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/submissions/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [], "total": 0, "page": 1, "per_page": 10, "pages": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .admin_search_submissions(&SearchQuery::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn create_submission_sends_body_and_decodes_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .and(body_json(json!({
            "url": "https://example.com",
            "document_type": "pp",
            "user_email": "ana@example.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(submission("s9", "initialized")))
        .mount(&server)
        .await;

    let request = SubmissionRequest {
        url: "https://example.com".into(),
        document_type: DocumentType::Pp,
        document_url: None,
        user_email: "ana@example.com".into(),
    };
    let record = client_for(&server).create_submission(&request).await.unwrap();
    assert_eq!(record.id, "s9");
    assert_eq!(record.status, SubmissionStatus::Initialized);
}

#[tokio::test]
async fn retry_submission_targets_record_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions/s1/retry"))
        .and(body_json(json!({
            "document_url": "https://example.com/privacy",
            "user_email": "ana@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(submission("s1", "processing")))
        .expect(1)
        .mount(&server)
        .await;

    let request = RetryRequest {
        document_url: Some("https://example.com/privacy".into()),
        user_email: "ana@example.com".into(),
    };
    let record = client_for(&server)
        .retry_submission("s1", &request)
        .await
        .unwrap();
    assert_eq!(record.status, SubmissionStatus::Processing);
}

#[tokio::test]
async fn server_error_carries_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/stats"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "warming up"})))
        .mount(&server)
        .await;

    let err = client_for(&server).get_document_stats().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Api {
            status: 503,
            message: "warming up".into()
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn error_without_body_uses_reason_phrase() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_document_by_id("missing", DocumentFetchOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Api {
            status: 404,
            message: "Not Found".into()
        }
    );
}

#[tokio::test]
async fn malformed_page_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/documents/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [], "total": 0, "page": 0, "per_page": 10, "pages": 0
        })))
        .mount(&server)
        .await;

    let query = DocumentQuery {
        text: "acme".into(),
        document_type: None,
        page: 1,
        page_size: 10,
    };
    let err = client_for(&server).search_documents(&query).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_document_stats().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn document_fetch_passes_skip_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/d1"))
        .and(query_param("skip_view_increment", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d1",
            "url": "https://example.com/terms",
            "document_type": "tos",
            "key_points": ["Data is sold"],
            "views": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = DocumentFetchOptions {
        skip_view_increment: true,
    };
    let detail = client_for(&server)
        .get_document_by_id("d1", options, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(detail.key_points, vec!["Data is sold".to_string()]);
    assert_eq!(detail.views, 12);
}

#[tokio::test]
async fn cancelled_document_fetch_resolves_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "slow", "url": "u", "document_type": "tos"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .get_document_by_id("slow", DocumentFetchOptions::default(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn missing_configuration_fails_every_call() {
    let client = ReqwestApiClient::new(ApiConfig::default()).unwrap();
    let err = client.get_document_stats().await.unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
}
