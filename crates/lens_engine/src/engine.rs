use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use lens_core::{DocumentId, Freshness, PaginatedResult, SearchQuery, SubmissionRecord};
use lens_logging::{lens_debug, lens_info};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, DocumentFetchOptions};
use crate::cache::{cache_key, QueryCache};
use crate::duplicate::check_existing;
use crate::retry::with_retry;
use crate::wire::SubmissionSearchBody;
use crate::{ApiError, EngineCommand, EngineEvent, EngineSettings};

/// Prefix shared by every cached submissions search.
pub const SUBMISSIONS_KEY_PREFIX: &str = "submissions/";
const USER_SEARCH_OP: &str = "submissions/user";
const ADMIN_SEARCH_OP: &str = "submissions/admin";

type SubmissionsCache = QueryCache<PaginatedResult<SubmissionRecord>>;

struct EngineContext {
    api: Arc<dyn ApiClient>,
    settings: EngineSettings,
    submissions: Arc<SubmissionsCache>,
    detail_fetches: Mutex<HashMap<DocumentId, (u64, CancellationToken)>>,
    next_detail: AtomicU64,
}

impl EngineContext {
    fn detail_fetches(&self) -> MutexGuard<'_, HashMap<DocumentId, (u64, CancellationToken)>> {
        self.detail_fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn register_detail(&self, document_id: &str) -> (u64, CancellationToken) {
        let seq = self.next_detail.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Some((_, previous)) = self
            .detail_fetches()
            .insert(document_id.to_string(), (seq, token.clone()))
        {
            previous.cancel();
        }
        (seq, token)
    }

    fn cancel_detail(&self, document_id: &str) {
        if let Some((_, token)) = self.detail_fetches().remove(document_id) {
            lens_debug!("cancel detail fetch {document_id}");
            token.cancel();
        }
    }

    fn finish_detail(&self, document_id: &str, seq: u64) {
        let mut fetches = self.detail_fetches();
        if fetches.get(document_id).is_some_and(|(current, _)| *current == seq) {
            fetches.remove(document_id);
        }
    }
}

/// Runs engine commands on a background tokio runtime and reports results
/// as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    submissions: Arc<SubmissionsCache>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn ApiClient>, settings: EngineSettings) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("lens-engine")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let submissions = Arc::new(QueryCache::new(settings.cache_policy));
        let context = Arc::new(EngineContext {
            api,
            settings,
            submissions: submissions.clone(),
            detail_fetches: Mutex::new(HashMap::new()),
            next_detail: AtomicU64::new(0),
        });

        thread::Builder::new()
            .name("lens-engine-commands".into())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    dispatch(&runtime, &context, command, &event_tx);
                }
                lens_debug!("engine command channel closed");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            submissions,
        })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn submissions_cache(&self) -> &QueryCache<PaginatedResult<SubmissionRecord>> {
        &self.submissions
    }
}

/// Cache invalidation and cancellation take effect before any later command
/// starts; everything else runs concurrently on the runtime.
fn dispatch(
    runtime: &tokio::runtime::Runtime,
    context: &Arc<EngineContext>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::InvalidateSearches => {
            let evicted = context.submissions.invalidate_by_prefix(SUBMISSIONS_KEY_PREFIX);
            lens_info!("invalidated {evicted} cached submissions searches");
        }
        EngineCommand::CancelDocument { document_id } => context.cancel_detail(&document_id),
        EngineCommand::FetchDocument {
            document_id,
            skip_view_increment,
        } => {
            let (seq, token) = context.register_detail(&document_id);
            let context = context.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let options = DocumentFetchOptions {
                    skip_view_increment,
                };
                let result = context
                    .api
                    .get_document_by_id(&document_id, options, &token)
                    .await;
                context.finish_detail(&document_id, seq);
                let _ = event_tx.send(EngineEvent::DocumentLoaded {
                    document_id,
                    result,
                });
            });
        }
        command => {
            let context = context.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                if let Some(event) = handle_command(&context, command).await {
                    let _ = event_tx.send(event);
                }
            });
        }
    }
}

async fn handle_command(context: &EngineContext, command: EngineCommand) -> Option<EngineEvent> {
    let api = context.api.as_ref();
    let retry = context.settings.retry.as_ref();
    let event = match command {
        EngineCommand::SearchSubmissions {
            request_id,
            query,
            freshness,
        } => {
            let result =
                cached_search(context, USER_SEARCH_OP, query, freshness, SearchScope::User).await;
            EngineEvent::SubmissionsLoaded { request_id, result }
        }
        EngineCommand::AdminSearchSubmissions { request_id, query } => {
            let result =
                cached_search(context, ADMIN_SEARCH_OP, query, Freshness::Force, SearchScope::Admin)
                    .await;
            EngineEvent::SubmissionsLoaded { request_id, result }
        }
        EngineCommand::SearchDocuments { request_id, query } => {
            let result = with_retry(retry, || api.search_documents(&query)).await;
            EngineEvent::DocumentsLoaded { request_id, result }
        }
        EngineCommand::FetchStats => {
            EngineEvent::StatsLoaded(with_retry(retry, || api.get_document_stats()).await)
        }
        EngineCommand::CheckDuplicate {
            flow,
            url,
            document_type,
            user_email,
        } => {
            let result = check_existing(api, &url, document_type, &user_email).await;
            EngineEvent::DuplicateChecked { flow, result }
        }
        EngineCommand::CreateSubmission(request) => {
            EngineEvent::SubmissionCreated(api.create_submission(&request).await)
        }
        EngineCommand::RetrySubmission {
            submission_id,
            request,
        } => {
            let result = api.retry_submission(&submission_id, &request).await;
            EngineEvent::RetryFinished {
                submission_id,
                result,
            }
        }
        EngineCommand::InvalidateSearches
        | EngineCommand::CancelDocument { .. }
        | EngineCommand::FetchDocument { .. } => return None,
    };
    Some(event)
}

#[derive(Clone, Copy)]
enum SearchScope {
    User,
    Admin,
}

async fn cached_search(
    context: &EngineContext,
    operation: &str,
    query: SearchQuery,
    freshness: Freshness,
    scope: SearchScope,
) -> Result<PaginatedResult<SubmissionRecord>, ApiError> {
    let key = cache_key(operation, &SubmissionSearchBody::from(&query))?;
    let api = context.api.clone();
    let retry = context.settings.retry.clone();
    context
        .submissions
        .fetch(&key, freshness, move || async move {
            with_retry(retry.as_ref(), || match scope {
                SearchScope::User => api.search_submissions(&query),
                SearchScope::Admin => api.admin_search_submissions(&query),
            })
            .await
        })
        .await
}
