//! Lens core: pure domain model, search controller and workflow state machines.
mod context;
mod domain;
mod effect;
mod failure;
mod model;
mod msg;
mod pagination;
mod query;
mod state;
mod update;
mod view_model;
mod workflow;

/// Identifies one issued list or search request; later ids supersede earlier ones.
pub type RequestId = u64;

pub use context::{ContextStore, MemoryContextStore, NavigationContext};
pub use domain::{extract_domain, matches_domain, normalize_url};
pub use effect::{Effect, Freshness};
pub use failure::{ErrorKind, Failure};
pub use model::{
    DocumentDetail, DocumentId, DocumentItem, DocumentStats, DocumentType, DuplicateCheckResult,
    PaginatedResult, RetryRequest, SortOrder, SubmissionId, SubmissionRecord, SubmissionRequest,
    SubmissionStatus, UnknownVariant, UserIdentity, DUPLICATE_MARKER,
};
pub use msg::{FetchTarget, Msg};
pub use pagination::{append_unique, page_window, Identified, PageItem, PAGE_WINDOW_THRESHOLD};
pub use query::{DocumentQuery, FilterChange, SearchQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use state::{AppState, WorkflowTimings};
pub use update::update;
pub use view_model::{
    AppViewModel, CreateFlowView, DetailView, DocumentSearchView, ErrorView, StatsView,
    SubmissionRowView,
};
pub use workflow::{
    CreateFlow, DuplicateOutcome, FinishOutcome, FlowKey, RetryBoard, RetryPhase, RetrySession,
    RetryStart, SubmitPhase, WorkflowError,
};
