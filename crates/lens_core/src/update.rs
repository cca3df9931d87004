use lens_logging::lens_debug;

use crate::failure::{ErrorKind, Failure};
use crate::pagination::append_unique;
use crate::query::{DocumentQuery, FilterChange, DEFAULT_PAGE_SIZE};
use crate::state::DetailState;
use crate::workflow::{DuplicateOutcome, FinishOutcome, FlowKey};
use crate::{AppState, Effect, FetchTarget, Freshness, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SignedIn(user) => {
            let changed = state.identity.as_ref() != Some(&user);
            state.identity = Some(user);
            state.mark_dirty();
            if changed {
                clear_user_data(&mut state);
                if state.submissions.page_open && !state.is_admin() {
                    start_submissions_fetch(&mut state, Freshness::Mount)
                } else {
                    Vec::new()
                }
            } else {
                Vec::new()
            }
        }
        Msg::SignedOut => {
            state.identity = None;
            clear_user_data(&mut state);
            state.mark_dirty();
            Vec::new()
        }
        Msg::RestoreContext(context) => {
            if state.submissions.query == crate::SearchQuery::default() {
                if let Some(raw) = context.last_submissions_query.as_deref() {
                    state.submissions.query = crate::SearchQuery::from_query_string(raw);
                }
            }
            state.navigation = context;
            state.mark_dirty();
            Vec::new()
        }
        Msg::UrlRestored(raw) => {
            state.submissions.query = crate::SearchQuery::from_query_string(&raw);
            state.submissions.lookup = false;
            state.mark_dirty();
            if state.submissions.page_open && !state.is_admin() {
                start_submissions_fetch(&mut state, Freshness::Cached)
            } else {
                Vec::new()
            }
        }
        Msg::Focused => {
            if state.submissions.page_open && !state.is_admin() {
                start_submissions_fetch(&mut state, Freshness::Focus)
            } else {
                Vec::new()
            }
        }

        Msg::SubmissionsPageOpened => {
            state.submissions.page_open = true;
            state.submissions.lookup = false;
            state.mark_dirty();
            if state.is_admin() {
                // Admin searches are unscoped and only run on demand.
                Vec::new()
            } else {
                start_submissions_fetch(&mut state, Freshness::Mount)
            }
        }
        Msg::SubmissionsLookupOpened(query) => {
            state.submissions.page_open = true;
            state.submissions.lookup = true;
            state.submissions.query = query;
            state.mark_dirty();
            if state.is_admin() {
                start_admin_search(&mut state)
            } else {
                start_submissions_fetch(&mut state, Freshness::Mount)
            }
        }
        Msg::SearchTextChanged(text) => apply_filter(&mut state, FilterChange::Text(text)),
        Msg::SearchDebounceElapsed { revision } => {
            if revision == state.submissions.text_revision && !state.is_admin() {
                start_submissions_fetch(&mut state, Freshness::Cached)
            } else {
                Vec::new()
            }
        }
        Msg::DocumentTypeFilterChanged(value) => {
            apply_filter(&mut state, FilterChange::DocumentType(value))
        }
        Msg::StatusFilterChanged(value) => apply_filter(&mut state, FilterChange::Status(value)),
        Msg::UserEmailFilterChanged(value) => {
            if state.is_admin() {
                apply_filter(&mut state, FilterChange::UserEmail(value))
            } else {
                Vec::new()
            }
        }
        Msg::PageSizeChanged(size) => apply_filter(&mut state, FilterChange::PageSize(size)),
        Msg::SortOrderChanged(order) => apply_filter(&mut state, FilterChange::SortOrder(order)),
        Msg::PageSelected(page) => apply_filter(&mut state, FilterChange::Page(page)),
        Msg::AdminSearchTriggered => {
            if state.is_admin() {
                start_admin_search(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionsLoaded { request_id, result } => {
            if state.submissions.in_flight != Some(request_id) {
                lens_debug!("dropping superseded submissions response {request_id}");
                return (state, Vec::new());
            }
            state.submissions.in_flight = None;
            state.submissions.cold_start = false;
            match result {
                Ok(page) => {
                    state.submissions.error = flagged_failure(page.error_flag, &page.error_message);
                    state.submissions.result = Some(page);
                }
                Err(failure) => state.submissions.error = Some(failure),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::RetryFetchClicked(target) => retry_fetch(&mut state, target),

        Msg::SubmitRequested {
            url,
            document_type,
            document_url,
        } => {
            let email = state.user_email().map(str::to_string);
            state.mark_dirty();
            match state
                .create
                .begin(&url, document_type, document_url.as_deref(), email.as_deref())
            {
                Ok(request) => vec![Effect::CheckDuplicate {
                    flow: FlowKey::Create,
                    url: request.url,
                    document_type: request.document_type,
                    user_email: request.user_email,
                }],
                Err(_) => Vec::new(),
            }
        }
        Msg::DuplicateChecked { flow, result } => {
            let outcome = match &flow {
                FlowKey::Create => state.create.duplicate_checked(result),
                FlowKey::Retry(id) => state.retries.duplicate_checked(id, result),
            };
            after_duplicate(&mut state, flow, outcome)
        }
        Msg::DuplicateDecision { flow, proceed } => {
            let outcome = match &flow {
                FlowKey::Create => state.create.resolve_duplicate(proceed),
                FlowKey::Retry(id) => state.retries.resolve_duplicate(id, proceed),
            };
            after_duplicate(&mut state, flow, outcome)
        }
        Msg::SubmissionCreated { result } => match state.create.finish(result) {
            FinishOutcome::Success { redirect_to } => {
                state.mark_dirty();
                let mut effects = vec![Effect::InvalidateSearches];
                if let Some(document_id) = redirect_to {
                    effects.push(Effect::NavigateToDocument(document_id));
                }
                if state.submissions.page_open && !state.is_admin() {
                    effects.extend(start_submissions_fetch(&mut state, Freshness::Cached));
                }
                effects
            }
            FinishOutcome::Error => {
                state.mark_dirty();
                Vec::new()
            }
            FinishOutcome::Ignored => Vec::new(),
        },
        Msg::SubmitFormReset => {
            if !state.create.is_running() {
                state.create.reset();
                state.mark_dirty();
            }
            Vec::new()
        }

        Msg::RetryRequested {
            submission_id,
            document_url,
        } => {
            let Some(record) = state.find_submission(&submission_id).cloned() else {
                return (state, Vec::new());
            };
            let email = state.user_email().map(str::to_string);
            state.mark_dirty();
            match state
                .retries
                .begin(&record, document_url.as_deref(), email.as_deref())
            {
                Ok(start) => vec![Effect::CheckDuplicate {
                    flow: FlowKey::Retry(start.submission_id),
                    url: start.url,
                    document_type: start.document_type,
                    user_email: start.user_email,
                }],
                Err(_) => Vec::new(),
            }
        }
        Msg::RetryFinished {
            submission_id,
            result,
        } => {
            let outcome = state.retries.finish(&submission_id, result.as_ref());
            if outcome == FinishOutcome::Ignored {
                return (state, Vec::new());
            }
            if let Ok(record) = result {
                state.replace_submission(record);
            }
            state.mark_dirty();
            let generation = state
                .retries
                .session(&submission_id)
                .map(|session| session.generation())
                .unwrap_or_default();
            let timings = state.timings;
            match outcome {
                FinishOutcome::Success { redirect_to } => {
                    let mut effects = vec![
                        Effect::InvalidateSearches,
                        Effect::Schedule {
                            after: timings.success_reset,
                            msg: Box::new(Msg::RetryResetElapsed {
                                submission_id,
                                generation,
                            }),
                        },
                    ];
                    if let Some(document_id) = redirect_to {
                        effects.push(Effect::NavigateToDocument(document_id));
                    }
                    effects
                }
                _ => vec![Effect::Schedule {
                    after: timings.error_reset,
                    msg: Box::new(Msg::RetryResetElapsed {
                        submission_id,
                        generation,
                    }),
                }],
            }
        }
        Msg::RetryResetElapsed {
            submission_id,
            generation,
        } => {
            if state.retries.reset_elapsed(&submission_id, generation) {
                state.mark_dirty();
            }
            Vec::new()
        }

        Msg::DocumentSearchSubmitted {
            text,
            document_type,
        } => {
            let text = text.trim().to_string();
            state.documents.items.clear();
            state.documents.total = 0;
            state.documents.page_count = 0;
            state.documents.loaded = None;
            let mut effects = start_document_search(
                &mut state,
                DocumentQuery {
                    text: text.clone(),
                    document_type,
                    page: 1,
                    page_size: DEFAULT_PAGE_SIZE,
                },
            );
            if state.remember_document_search(&text, document_type) {
                effects.push(Effect::PersistContext(state.navigation_snapshot()));
            }
            effects
        }
        Msg::LoadMoreDocuments => {
            if state.documents.in_flight.is_some() || !state.documents.has_more() {
                return (state, Vec::new());
            }
            match state.documents.loaded.clone() {
                Some(loaded) => {
                    let next = DocumentQuery {
                        page: loaded.page + 1,
                        ..loaded
                    };
                    start_document_search(&mut state, next)
                }
                None => Vec::new(),
            }
        }
        Msg::DocumentsLoaded { request_id, result } => {
            if state.documents.in_flight != Some(request_id) {
                return (state, Vec::new());
            }
            state.documents.in_flight = None;
            state.documents.cold_start = false;
            match result {
                Ok(page) if page.error_flag => {
                    state.documents.error = flagged_failure(true, &page.error_message);
                }
                Ok(page) => {
                    let requested = state.documents.requested.clone();
                    let first_page = requested.as_ref().map_or(true, |q| q.page <= 1);
                    if first_page {
                        state.documents.items = page.items;
                    } else {
                        append_unique(&mut state.documents.items, page.items);
                    }
                    state.documents.total = page.total;
                    state.documents.page_count = page.page_count;
                    state.documents.loaded = requested;
                    state.documents.error = None;
                }
                Err(failure) => state.documents.error = Some(failure),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::ColdStartElapsed { request_id } => {
            if state.submissions.in_flight == Some(request_id) {
                state.submissions.cold_start = true;
                state.mark_dirty();
            }
            if state.documents.in_flight == Some(request_id) {
                state.documents.cold_start = true;
                state.mark_dirty();
            }
            Vec::new()
        }

        Msg::DocumentOpened {
            document_id,
            skip_view_increment,
        } => {
            let mut effects = Vec::new();
            if state.detail.in_flight {
                match state.detail.document_id.clone() {
                    Some(current) if current == document_id => return (state, effects),
                    Some(current) => effects.push(Effect::CancelDocumentFetch {
                        document_id: current,
                    }),
                    None => {}
                }
            }
            state.detail = DetailState {
                document_id: Some(document_id.clone()),
                skip_view_increment,
                in_flight: true,
                document: None,
                error: None,
            };
            state.mark_dirty();
            effects.push(Effect::FetchDocument {
                document_id: document_id.clone(),
                skip_view_increment,
            });
            if state.remember_document(&document_id) {
                effects.push(Effect::PersistContext(state.navigation_snapshot()));
            }
            effects
        }
        Msg::DocumentClosed => {
            let mut effects = Vec::new();
            if state.detail.in_flight {
                if let Some(document_id) = state.detail.document_id.clone() {
                    effects.push(Effect::CancelDocumentFetch { document_id });
                }
            }
            state.detail = DetailState::default();
            state.mark_dirty();
            effects
        }
        Msg::DocumentLoaded {
            document_id,
            result,
        } => {
            if state.detail.document_id.as_deref() != Some(document_id.as_str()) {
                return (state, Vec::new());
            }
            state.detail.in_flight = false;
            match result {
                Ok(document) => {
                    state.detail.document = Some(document);
                    state.detail.error = None;
                }
                Err(failure) if failure.is_cancelled() => {}
                Err(failure) => state.detail.error = Some(failure),
            }
            state.mark_dirty();
            Vec::new()
        }

        Msg::StatsRequested => start_stats_fetch(&mut state),
        Msg::StatsLoaded(result) => {
            state.stats.loading = false;
            match result {
                Ok(stats) => {
                    state.stats.stats = stats;
                    state.stats.error = None;
                }
                Err(failure) => {
                    if failure.kind == ErrorKind::Configuration {
                        state.stats.stats = Default::default();
                    }
                    state.stats.error = Some(failure);
                }
            }
            state.mark_dirty();
            Vec::new()
        }

        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn clear_user_data(state: &mut AppState) {
    state.submissions.result = None;
    state.submissions.in_flight = None;
    state.submissions.error = None;
    state.submissions.cold_start = false;
    state.retries.clear();
    if !state.create.is_running() {
        state.create.reset();
    }
}

fn apply_filter(state: &mut AppState, change: FilterChange) -> Vec<Effect> {
    let is_text = matches!(change, FilterChange::Text(_));
    let paging = matches!(
        change,
        FilterChange::Page(_) | FilterChange::PageSize(_) | FilterChange::SortOrder(_)
    );
    let next = state.submissions.query.with_change(change);
    if next == state.submissions.query {
        return Vec::new();
    }
    state.submissions.query = next;
    state.submissions.lookup = false;
    state.mark_dirty();

    let mut effects = vec![Effect::SyncQueryString(
        state.submissions.query.to_query_string(),
    )];
    if state.is_admin() {
        // Filter edits wait for an explicit search. Paging through results
        // that are already on screen is itself explicit.
        if paging && state.submissions.result.is_some() {
            effects.extend(start_admin_search(state));
        }
        return effects;
    }
    if state.identity.is_none() {
        return effects;
    }
    if is_text {
        state.submissions.text_revision += 1;
        effects.push(Effect::Schedule {
            after: state.timings.search_debounce,
            msg: Box::new(Msg::SearchDebounceElapsed {
                revision: state.submissions.text_revision,
            }),
        });
    } else {
        effects.extend(start_submissions_fetch(state, Freshness::Cached));
    }
    effects
}

fn start_submissions_fetch(state: &mut AppState, freshness: Freshness) -> Vec<Effect> {
    let Some(email) = state.user_email().map(str::to_string) else {
        return Vec::new();
    };
    let query = state.submissions.query.scoped_to(&email);
    let request_id = begin_submissions_request(state);
    let mut effects = vec![
        Effect::FetchSubmissions {
            request_id,
            query,
            freshness,
        },
        cold_start_timer(state, request_id),
    ];
    if state.remember_submissions_query() {
        effects.push(Effect::PersistContext(state.navigation_snapshot()));
    }
    effects
}

fn start_admin_search(state: &mut AppState) -> Vec<Effect> {
    let query = state.submissions.query.clone();
    let request_id = begin_submissions_request(state);
    let mut effects = vec![
        Effect::AdminSearchSubmissions { request_id, query },
        cold_start_timer(state, request_id),
    ];
    if state.remember_submissions_query() {
        effects.push(Effect::PersistContext(state.navigation_snapshot()));
    }
    effects
}

fn begin_submissions_request(state: &mut AppState) -> crate::RequestId {
    let request_id = state.next_request_id();
    state.submissions.in_flight = Some(request_id);
    state.submissions.error = None;
    state.submissions.cold_start = false;
    state.mark_dirty();
    request_id
}

fn start_document_search(state: &mut AppState, query: DocumentQuery) -> Vec<Effect> {
    let request_id = state.next_request_id();
    state.documents.requested = Some(query.clone());
    state.documents.in_flight = Some(request_id);
    state.documents.error = None;
    state.documents.cold_start = false;
    state.mark_dirty();
    vec![
        Effect::SearchDocuments { request_id, query },
        cold_start_timer(state, request_id),
    ]
}

fn start_stats_fetch(state: &mut AppState) -> Vec<Effect> {
    if state.stats.loading {
        return Vec::new();
    }
    state.stats.loading = true;
    state.mark_dirty();
    vec![Effect::FetchStats]
}

fn cold_start_timer(state: &AppState, request_id: crate::RequestId) -> Effect {
    Effect::Schedule {
        after: state.timings.cold_start_notice,
        msg: Box::new(Msg::ColdStartElapsed { request_id }),
    }
}

fn retry_fetch(state: &mut AppState, target: FetchTarget) -> Vec<Effect> {
    match target {
        FetchTarget::Submissions => {
            if state.is_admin() {
                start_admin_search(state)
            } else {
                start_submissions_fetch(state, Freshness::Force)
            }
        }
        FetchTarget::Documents => match state.documents.requested.clone() {
            Some(query) if state.documents.in_flight.is_none() => {
                start_document_search(state, query)
            }
            _ => Vec::new(),
        },
        FetchTarget::Document => {
            let Some(document_id) = state.detail.document_id.clone() else {
                return Vec::new();
            };
            if state.detail.in_flight {
                return Vec::new();
            }
            state.detail.in_flight = true;
            state.detail.error = None;
            state.mark_dirty();
            vec![Effect::FetchDocument {
                document_id,
                skip_view_increment: state.detail.skip_view_increment,
            }]
        }
        FetchTarget::Stats => start_stats_fetch(state),
    }
}

fn after_duplicate(state: &mut AppState, flow: FlowKey, outcome: DuplicateOutcome) -> Vec<Effect> {
    if outcome != DuplicateOutcome::Ignored {
        state.mark_dirty();
    }
    match outcome {
        DuplicateOutcome::Proceed => match flow {
            FlowKey::Create => state
                .create
                .request()
                .cloned()
                .map(Effect::CreateSubmission)
                .into_iter()
                .collect(),
            FlowKey::Retry(submission_id) => {
                let Some(request) = state
                    .retries
                    .session(&submission_id)
                    .map(|session| session.request().clone())
                else {
                    return Vec::new();
                };
                vec![Effect::RetrySubmission {
                    submission_id,
                    request,
                }]
            }
        },
        DuplicateOutcome::Abort(Some(document_id)) => {
            vec![Effect::NavigateToDocument(document_id)]
        }
        DuplicateOutcome::Abort(None)
        | DuplicateOutcome::AwaitDecision(_)
        | DuplicateOutcome::Ignored => Vec::new(),
    }
}

fn flagged_failure(error_flag: bool, message: &Option<String>) -> Option<Failure> {
    error_flag.then(|| {
        Failure::new(
            ErrorKind::Processing,
            message
                .clone()
                .unwrap_or_else(|| "The search could not be completed".to_string()),
        )
    })
}
