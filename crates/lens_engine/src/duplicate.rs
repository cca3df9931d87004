use lens_core::{
    extract_domain, matches_domain, DocumentType, DuplicateCheckResult, SearchQuery, SortOrder,
    SubmissionStatus,
};
use lens_logging::{lens_debug, lens_warn};

use crate::ApiClient;

/// How many of the user's successful submissions are scanned for a match.
pub const DUPLICATE_SCAN_SIZE: u32 = 10;

/// Look for a successful submission by `user_email` whose URL is on the same
/// domain as `url`.
///
/// Advisory only: a failed lookup is logged and reported as "no duplicate" so
/// that submission can still proceed.
pub async fn check_existing(
    api: &dyn ApiClient,
    url: &str,
    document_type: DocumentType,
    user_email: &str,
) -> DuplicateCheckResult {
    let domain = extract_domain(url);
    if domain.is_empty() || user_email.trim().is_empty() {
        return DuplicateCheckResult::none();
    }

    let query = SearchQuery {
        text: domain.clone(),
        document_type: Some(document_type),
        status: Some(SubmissionStatus::Success),
        user_email: Some(user_email.to_string()),
        page: 1,
        page_size: DUPLICATE_SCAN_SIZE,
        sort_order: SortOrder::Desc,
    };

    match api.search_submissions(&query).await {
        Ok(page) => {
            let hit = page.items.into_iter().find(|record| {
                record.status == SubmissionStatus::Success && matches_domain(&record.url, &domain)
            });
            match hit {
                Some(record) => {
                    lens_debug!("duplicate of {} found via submission {}", domain, record.id);
                    DuplicateCheckResult::found(record.document_id)
                }
                None => DuplicateCheckResult::none(),
            }
        }
        Err(err) => {
            lens_warn!("duplicate check for {domain} failed, proceeding: {err}");
            DuplicateCheckResult::none()
        }
    }
}
