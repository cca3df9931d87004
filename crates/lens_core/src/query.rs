//! Search parameters for the submissions table and the document search.
//!
//! A `SearchQuery` is never edited in place by the state machine: each filter
//! change produces a new value through [`SearchQuery::with_change`].

use url::form_urlencoded;

use crate::model::{DocumentType, SortOrder, SubmissionStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub document_type: Option<DocumentType>,
    pub status: Option<SubmissionStatus>,
    pub user_email: Option<String>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort_order: SortOrder,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            document_type: None,
            status: None,
            user_email: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_order: SortOrder::default(),
        }
    }
}

/// A single edit made through the filter controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Text(String),
    DocumentType(Option<DocumentType>),
    Status(Option<SubmissionStatus>),
    UserEmail(Option<String>),
    PageSize(u32),
    SortOrder(SortOrder),
    Page(u32),
}

impl SearchQuery {
    /// New query with `change` applied. Any change other than `Page` moves
    /// back to the first page.
    pub fn with_change(&self, change: FilterChange) -> SearchQuery {
        let mut next = self.clone();
        match change {
            FilterChange::Page(page) => {
                next.page = page.max(1);
                return next;
            }
            FilterChange::Text(text) => next.text = text,
            FilterChange::DocumentType(document_type) => next.document_type = document_type,
            FilterChange::Status(status) => next.status = status,
            FilterChange::UserEmail(email) => {
                next.user_email = email.filter(|e| !e.trim().is_empty())
            }
            FilterChange::PageSize(size) => next.page_size = clamp_page_size(size),
            FilterChange::SortOrder(order) => next.sort_order = order,
        }
        next.page = 1;
        next
    }

    /// Same query restricted to one user's submissions.
    pub fn scoped_to(&self, email: &str) -> SearchQuery {
        SearchQuery {
            user_email: Some(email.to_string()),
            ..self.clone()
        }
    }

    /// Encode the shareable part of the query (`q, type, status, perPage,
    /// order, page`). Default values are omitted.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.text.is_empty() {
            out.append_pair("q", &self.text);
        }
        if let Some(document_type) = self.document_type {
            out.append_pair("type", document_type.as_str());
        }
        if let Some(status) = self.status {
            out.append_pair("status", status.as_str());
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            out.append_pair("perPage", &self.page_size.to_string());
        }
        if self.sort_order != SortOrder::default() {
            out.append_pair("order", self.sort_order.as_str());
        }
        if self.page != 1 {
            out.append_pair("page", &self.page.to_string());
        }
        out.finish()
    }

    /// Decode a query string produced by [`SearchQuery::to_query_string`].
    /// Unknown keys and unparsable values are ignored.
    pub fn from_query_string(raw: &str) -> SearchQuery {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut query = SearchQuery::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "q" => query.text = value.into_owned(),
                "type" => query.document_type = value.parse().ok(),
                "status" => query.status = value.parse().ok(),
                "perPage" => {
                    if let Ok(size) = value.parse::<u32>() {
                        query.page_size = clamp_page_size(size);
                    }
                }
                "order" => {
                    if let Ok(order) = value.parse() {
                        query.sort_order = order;
                    }
                }
                "page" => {
                    if let Ok(page) = value.parse::<u32>() {
                        query.page = page.max(1);
                    }
                }
                _ => {}
            }
        }
        query
    }
}

fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}

/// Parameters of a public document search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub text: String,
    pub document_type: Option<DocumentType>,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn on_page(page: u32) -> SearchQuery {
        SearchQuery::default().with_change(FilterChange::Page(page))
    }

    #[test]
    fn every_filter_change_except_page_resets_page() {
        let changes = vec![
            FilterChange::Text("x".into()),
            FilterChange::DocumentType(Some(DocumentType::Pp)),
            FilterChange::Status(Some(SubmissionStatus::Failed)),
            FilterChange::UserEmail(Some("a@b.com".into())),
            FilterChange::PageSize(50),
            FilterChange::SortOrder(SortOrder::Asc),
        ];
        for change in changes {
            assert_eq!(on_page(4).with_change(change.clone()).page, 1, "{change:?}");
        }
        assert_eq!(on_page(4).with_change(FilterChange::Page(7)).page, 7);
    }

    #[test]
    fn with_change_leaves_original_untouched() {
        let original = on_page(3);
        let _ = original.with_change(FilterChange::Text("tos".into()));
        assert_eq!(original.page, 3);
        assert_eq!(original.text, "");
    }

    #[test]
    fn query_string_round_trips() {
        let query = SearchQuery {
            text: "face book&co".into(),
            document_type: Some(DocumentType::Tos),
            status: Some(SubmissionStatus::Success),
            user_email: None,
            page: 3,
            page_size: 20,
            sort_order: SortOrder::Asc,
        };
        let encoded = query.to_query_string();
        assert_eq!(
            encoded,
            "q=face+book%26co&type=tos&status=success&perPage=20&order=asc&page=3"
        );
        assert_eq!(SearchQuery::from_query_string(&encoded), query);
    }

    #[test]
    fn defaults_encode_to_empty_string() {
        assert_eq!(SearchQuery::default().to_query_string(), "");
        assert_eq!(SearchQuery::from_query_string(""), SearchQuery::default());
    }

    #[test]
    fn bad_values_are_ignored() {
        let query = SearchQuery::from_query_string("?type=csv&page=zero&perPage=5000&foo=bar");
        assert_eq!(query.document_type, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
    }
}
