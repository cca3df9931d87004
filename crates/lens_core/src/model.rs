//! Domain types shared by the state machines and the engine.
//!
//! Records are projections of server-owned data. The core never edits a
//! record field by field; it only replaces whole records with what the server
//! returned.

use std::fmt;
use std::str::FromStr;

pub type SubmissionId = String;
pub type DocumentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Tos,
    Pp,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Tos => "tos",
            DocumentType::Pp => "pp",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tos" => Ok(DocumentType::Tos),
            "pp" => Ok(DocumentType::Pp),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStatus {
    Initialized,
    Processing,
    Success,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Initialized => "initialized",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "initialized" => Ok(SubmissionStatus::Initialized),
            "processing" => Ok(SubmissionStatus::Processing),
            "success" => Ok(SubmissionStatus::Success),
            "failed" => Ok(SubmissionStatus::Failed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value {:?}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub url: String,
    pub document_type: DocumentType,
    pub document_url: Option<String>,
    pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRequest {
    pub document_url: Option<String>,
    pub user_email: String,
}

/// Text the server puts in `error_message` when a submission resolved to an
/// existing document. Only consulted when the structured flag is absent.
pub const DUPLICATE_MARKER: &str = "already exists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub url: String,
    pub document_type: DocumentType,
    pub document_url: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: String,
    pub updated_at: String,
    pub document_id: Option<DocumentId>,
    pub user_email: String,
    pub error_message: Option<String>,
    /// Structured duplicate flag, when the server provides one.
    pub duplicate: Option<bool>,
}

impl SubmissionRecord {
    /// A successful submission that resolved to an already analysed document.
    pub fn is_duplicate_success(&self) -> bool {
        if self.status != SubmissionStatus::Success {
            return false;
        }
        match self.duplicate {
            Some(flag) => flag,
            // Compatibility shim for servers that only report duplicates in the
            // human-readable message. Breaks if the wording changes.
            None => self
                .error_message
                .as_deref()
                .map(|message| message.to_ascii_lowercase().contains(DUPLICATE_MARKER))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub error_flag: bool,
    pub error_message: Option<String>,
}

impl<T> PaginatedResult<T> {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size,
            page_count: 0,
            error_flag: false,
            error_message: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.page_count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentItem {
    pub id: DocumentId,
    pub url: String,
    pub document_type: DocumentType,
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub views: u64,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDetail {
    pub id: DocumentId,
    pub url: String,
    pub document_type: DocumentType,
    pub company_name: Option<String>,
    pub retrieved_url: Option<String>,
    pub one_sentence_summary: Option<String>,
    pub hundred_word_summary: Option<String>,
    pub scores: Vec<(String, f64)>,
    pub key_points: Vec<String>,
    pub views: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentStats {
    pub tos_count: u64,
    pub pp_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DuplicateCheckResult {
    pub exists: bool,
    pub document_id: Option<DocumentId>,
}

impl DuplicateCheckResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn found(document_id: Option<DocumentId>) -> Self {
        Self {
            exists: true,
            document_id,
        }
    }
}

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: SubmissionStatus, message: Option<&str>, duplicate: Option<bool>) -> SubmissionRecord {
        SubmissionRecord {
            id: "s1".into(),
            url: "https://example.com".into(),
            document_type: DocumentType::Tos,
            document_url: None,
            status,
            created_at: String::new(),
            updated_at: String::new(),
            document_id: Some("d1".into()),
            user_email: "a@b.com".into(),
            error_message: message.map(str::to_string),
            duplicate,
        }
    }

    #[test]
    fn structured_flag_wins_over_message() {
        let rec = record(SubmissionStatus::Success, Some("Document already exists"), Some(false));
        assert!(!rec.is_duplicate_success());
        let rec = record(SubmissionStatus::Success, None, Some(true));
        assert!(rec.is_duplicate_success());
    }

    #[test]
    fn marker_fallback_requires_success_status() {
        let rec = record(SubmissionStatus::Success, Some("Document Already Exists"), None);
        assert!(rec.is_duplicate_success());
        let rec = record(SubmissionStatus::Failed, Some("document already exists"), None);
        assert!(!rec.is_duplicate_success());
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("TOS".parse::<DocumentType>(), Ok(DocumentType::Tos));
        assert_eq!(" failed ".parse::<SubmissionStatus>(), Ok(SubmissionStatus::Failed));
        assert!("csv".parse::<DocumentType>().is_err());
    }
}
