use crate::context::NavigationContext;
use crate::failure::Failure;
use crate::model::{
    DocumentDetail, DocumentId, DocumentItem, DocumentStats, DocumentType, DuplicateCheckResult,
    PaginatedResult, SortOrder, SubmissionId, SubmissionRecord, SubmissionStatus, UserIdentity,
};
use crate::query::SearchQuery;
use crate::workflow::FlowKey;
use crate::RequestId;

/// Which failed fetch a "Try Again" click refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Submissions,
    Documents,
    Document,
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Identity provider reported a signed-in user.
    SignedIn(UserIdentity),
    SignedOut,
    /// Navigation context loaded from the store at startup.
    RestoreContext(NavigationContext),
    /// Query string of the submissions page URL (reload or shared link).
    UrlRestored(String),
    /// Window regained focus.
    Focused,

    /// Submissions page mounted.
    SubmissionsPageOpened,
    /// Load submissions matching `query` for a one-off lookup. The saved
    /// navigation context keeps the user's own table query.
    SubmissionsLookupOpened(SearchQuery),
    /// User edited the free-text filter (not debounced).
    SearchTextChanged(String),
    /// Debounce timer for a text edit expired.
    SearchDebounceElapsed { revision: u64 },
    DocumentTypeFilterChanged(Option<DocumentType>),
    StatusFilterChanged(Option<SubmissionStatus>),
    /// Admin-only filter on the submitting user.
    UserEmailFilterChanged(Option<String>),
    PageSizeChanged(u32),
    SortOrderChanged(SortOrder),
    PageSelected(u32),
    /// Admin pressed Search or Enter.
    AdminSearchTriggered,
    SubmissionsLoaded {
        request_id: RequestId,
        result: Result<PaginatedResult<SubmissionRecord>, Failure>,
    },
    /// User clicked "Try Again" next to a failed fetch.
    RetryFetchClicked(FetchTarget),

    /// User submitted the create form.
    SubmitRequested {
        url: String,
        document_type: DocumentType,
        document_url: Option<String>,
    },
    DuplicateChecked {
        flow: FlowKey,
        result: DuplicateCheckResult,
    },
    /// User answered the "already analysed" prompt.
    DuplicateDecision { flow: FlowKey, proceed: bool },
    SubmissionCreated {
        result: Result<SubmissionRecord, Failure>,
    },
    SubmitFormReset,

    /// User clicked Retry on a failed submission.
    RetryRequested {
        submission_id: SubmissionId,
        document_url: Option<String>,
    },
    RetryFinished {
        submission_id: SubmissionId,
        result: Result<SubmissionRecord, Failure>,
    },
    /// Display delay for a finished retry expired.
    RetryResetElapsed {
        submission_id: SubmissionId,
        generation: u64,
    },

    /// Public search box submitted.
    DocumentSearchSubmitted {
        text: String,
        document_type: Option<DocumentType>,
    },
    LoadMoreDocuments,
    DocumentsLoaded {
        request_id: RequestId,
        result: Result<PaginatedResult<DocumentItem>, Failure>,
    },
    /// A request was still pending after the cold-start delay.
    ColdStartElapsed { request_id: RequestId },

    DocumentOpened {
        document_id: DocumentId,
        skip_view_increment: bool,
    },
    DocumentClosed,
    DocumentLoaded {
        document_id: DocumentId,
        result: Result<DocumentDetail, Failure>,
    },

    StatsRequested,
    StatsLoaded(Result<DocumentStats, Failure>),

    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
