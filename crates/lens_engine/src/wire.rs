//! JSON shapes exchanged with the document service.
//!
//! Incoming payloads are decoded into these structs first and then converted
//! into core types; any shape or enum mismatch becomes [`ApiError::Decode`].

use std::collections::BTreeMap;

use lens_core::{
    DocumentDetail, DocumentItem, DocumentQuery, DocumentStats, DocumentType, PaginatedResult,
    RetryRequest, SearchQuery, SubmissionRecord, SubmissionRequest, SubmissionStatus,
};
use serde::{Deserialize, Serialize};

use crate::ApiError;

#[derive(Debug, Serialize)]
pub(crate) struct DocumentSearchBody<'a> {
    pub search_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<&'static str>,
    pub page: u32,
    pub per_page: u32,
}

impl<'a> From<&'a DocumentQuery> for DocumentSearchBody<'a> {
    fn from(query: &'a DocumentQuery) -> Self {
        Self {
            search_text: query.text.trim(),
            document_type: query.document_type.map(DocumentType::as_str),
            page: query.page.max(1),
            per_page: query.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionSearchBody<'a> {
    pub search_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<&'a str>,
    pub page: u32,
    pub per_page: u32,
    pub sort_order: &'static str,
}

impl<'a> From<&'a SearchQuery> for SubmissionSearchBody<'a> {
    fn from(query: &'a SearchQuery) -> Self {
        Self {
            search_text: query.text.trim(),
            document_type: query.document_type.map(DocumentType::as_str),
            status: query.status.map(SubmissionStatus::as_str),
            user_email: query.user_email.as_deref().filter(|email| !email.is_empty()),
            page: query.page.max(1),
            per_page: query.page_size,
            sort_order: query.sort_order.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateSubmissionBody<'a> {
    pub url: &'a str,
    pub document_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<&'a str>,
    pub user_email: &'a str,
}

impl<'a> From<&'a SubmissionRequest> for CreateSubmissionBody<'a> {
    fn from(request: &'a SubmissionRequest) -> Self {
        Self {
            url: &request.url,
            document_type: request.document_type.as_str(),
            document_url: request.document_url.as_deref(),
            user_email: &request.user_email,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RetryBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<&'a str>,
    pub user_email: &'a str,
}

impl<'a> From<&'a RetryRequest> for RetryBody<'a> {
    fn from(request: &'a RetryRequest) -> Self {
        Self {
            document_url: request.document_url.as_deref(),
            user_email: &request.user_email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> WirePage<T> {
    /// Validate the envelope and convert every item.
    pub fn into_result<U>(self) -> Result<PaginatedResult<U>, ApiError>
    where
        U: TryFrom<T, Error = ApiError>,
    {
        if self.page == 0 {
            return Err(ApiError::decode("page numbers start at 1"));
        }
        if self.items.len() > self.per_page as usize {
            return Err(ApiError::decode(format!(
                "{} items exceed per_page {}",
                self.items.len(),
                self.per_page
            )));
        }
        let items = self
            .items
            .into_iter()
            .map(U::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult {
            items,
            total: self.total,
            page: self.page,
            page_size: self.per_page,
            page_count: self.pages,
            error_flag: self.error,
            error_message: self.message,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSubmission {
    #[serde(alias = "_id")]
    pub id: String,
    pub url: String,
    pub document_type: String,
    #[serde(default)]
    pub document_url: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub document_id: Option<String>,
    pub user_email: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub is_duplicate: Option<bool>,
    #[serde(default)]
    pub duplicate_of: Option<String>,
}

impl TryFrom<WireSubmission> for SubmissionRecord {
    type Error = ApiError;

    fn try_from(wire: WireSubmission) -> Result<Self, Self::Error> {
        let duplicate = match (wire.is_duplicate, wire.duplicate_of.is_some()) {
            (Some(flag), _) => Some(flag),
            (None, true) => Some(true),
            (None, false) => None,
        };
        Ok(SubmissionRecord {
            document_type: parse_document_type(&wire.document_type)?,
            status: wire
                .status
                .parse()
                .map_err(|err| ApiError::decode(format!("status: {err}")))?,
            document_id: wire.document_id.or(wire.duplicate_of),
            id: wire.id,
            url: wire.url,
            document_url: wire.document_url,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            user_email: wire.user_email,
            error_message: wire.error_message,
            duplicate,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocumentItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub url: String,
    pub document_type: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<WireDocumentItem> for DocumentItem {
    type Error = ApiError;

    fn try_from(wire: WireDocumentItem) -> Result<Self, Self::Error> {
        Ok(DocumentItem {
            document_type: parse_document_type(&wire.document_type)?,
            id: wire.id,
            url: wire.url,
            company_name: wire.company_name,
            logo_url: wire.logo_url,
            views: wire.views,
            updated_at: wire.updated_at,
        })
    }
}

/// Scores arrive either as bare numbers or as `{score, justification}` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireScore {
    Plain(f64),
    Detailed { score: f64 },
}

impl WireScore {
    fn value(&self) -> f64 {
        match self {
            WireScore::Plain(score) | WireScore::Detailed { score } => *score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocumentDetail {
    #[serde(alias = "_id")]
    pub id: String,
    pub url: String,
    pub document_type: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub retrieved_url: Option<String>,
    #[serde(default)]
    pub one_sentence_summary: Option<String>,
    #[serde(default)]
    pub hundred_word_summary: Option<String>,
    #[serde(default)]
    pub scores: BTreeMap<String, WireScore>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<WireDocumentDetail> for DocumentDetail {
    type Error = ApiError;

    fn try_from(wire: WireDocumentDetail) -> Result<Self, Self::Error> {
        Ok(DocumentDetail {
            document_type: parse_document_type(&wire.document_type)?,
            scores: wire
                .scores
                .iter()
                .map(|(name, score)| (name.clone(), score.value()))
                .collect(),
            id: wire.id,
            url: wire.url,
            company_name: wire.company_name,
            retrieved_url: wire.retrieved_url,
            one_sentence_summary: wire.one_sentence_summary,
            hundred_word_summary: wire.hundred_word_summary,
            key_points: wire.key_points,
            views: wire.views,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStats {
    pub tos_count: u64,
    pub pp_count: u64,
    pub total_count: u64,
}

impl From<WireStats> for DocumentStats {
    fn from(wire: WireStats) -> Self {
        DocumentStats {
            tos_count: wire.tos_count,
            pp_count: wire.pp_count,
            total_count: wire.total_count,
        }
    }
}

/// Error bodies: `{"detail": ...}`, `{"message": ...}` or `{"error": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl WireErrorBody {
    pub fn into_message(self) -> Option<String> {
        let detail = self.detail.and_then(|detail| match detail {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
        detail.or(self.message).or(self.error)
    }
}

fn parse_document_type(raw: &str) -> Result<DocumentType, ApiError> {
    raw.parse()
        .map_err(|err| ApiError::decode(format!("document_type: {err}")))
}
