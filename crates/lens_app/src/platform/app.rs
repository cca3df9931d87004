use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use lens_core::{
    update, AppState, AppViewModel, ContextStore, DuplicateCheckResult, FlowKey, Msg, SubmissionId,
    WorkflowTimings,
};
use lens_engine::EngineHandle;
use lens_logging::{lens_debug, lens_info};
use thiserror::Error;

use super::effects::EffectRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What to do when a submission targets an already analysed domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// Ask on the terminal.
    Ask,
    /// Submit anyway.
    Proceed,
    /// Open the existing analysis instead.
    Abort,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no answer from the server after {0:?}")]
    TimedOut(Duration),
}

/// Single-threaded driver: applies messages to the state and hands the
/// resulting effects to the runner.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
    duplicate_policy: DuplicatePolicy,
    watched_retries: Vec<SubmissionId>,
    cold_start_announced: bool,
}

impl App {
    pub fn new(
        engine: EngineHandle,
        store: Box<dyn ContextStore>,
        timings: WorkflowTimings,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(engine, msg_tx, store);
        let context = runner.store().load();
        let mut app = Self {
            state: AppState::with_timings(timings),
            runner,
            msg_rx,
            duplicate_policy,
            watched_retries: Vec::new(),
            cold_start_announced: false,
        };
        app.dispatch(Msg::RestoreContext(context));
        app
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.consume_dirty() {
            lens_debug!("state changed, {} effects", effects.len());
        }
        self.runner.enqueue(effects);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn query_string(&self) -> &str {
        self.runner.query_string()
    }

    /// Ask about duplicates found while retrying `submission_id`.
    pub fn watch_retry(&mut self, submission_id: impl Into<SubmissionId>) {
        self.watched_retries.push(submission_id.into());
    }

    /// Process messages until nothing is in flight.
    pub fn settle(&mut self, timeout: Duration) -> Result<(), AppError> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut progressed = false;
            while let Some(msg) = self.runner.poll_event() {
                self.dispatch(msg);
                progressed = true;
            }
            while let Ok(msg) = self.msg_rx.try_recv() {
                self.dispatch(msg);
                progressed = true;
            }
            if self.answer_duplicate_prompts() {
                continue;
            }
            self.announce_cold_start();

            if !self.state.is_busy() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::TimedOut(timeout));
            }
            if !progressed {
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    /// True when at least one decision was dispatched.
    fn answer_duplicate_prompts(&mut self) -> bool {
        let mut pending: Vec<(FlowKey, DuplicateCheckResult)> = Vec::new();
        if let Some(result) = self.state.create_flow().pending_duplicate() {
            pending.push((FlowKey::Create, result.clone()));
        }
        for id in &self.watched_retries {
            if let Some(result) = self
                .state
                .retries()
                .session(id)
                .and_then(|session| session.pending_duplicate())
            {
                pending.push((FlowKey::Retry(id.clone()), result.clone()));
            }
        }
        let answered = !pending.is_empty();
        for (flow, result) in pending {
            let proceed = self.decide(&result);
            lens_info!("duplicate decision for {:?}: proceed={}", flow, proceed);
            self.dispatch(Msg::DuplicateDecision { flow, proceed });
        }
        answered
    }

    fn decide(&self, result: &DuplicateCheckResult) -> bool {
        match self.duplicate_policy {
            DuplicatePolicy::Proceed => true,
            DuplicatePolicy::Abort => false,
            DuplicatePolicy::Ask => {
                let existing = result.document_id.as_deref().unwrap_or("unknown");
                confirm(&format!(
                    "This domain was already analysed (document {existing}). Submit anyway? [y/N] "
                ))
            }
        }
    }

    fn announce_cold_start(&mut self) {
        let view = self.state.view();
        let waking = view.cold_start_notice || view.documents.cold_start_notice;
        if waking && !self.cold_start_announced {
            eprintln!("The server is waking up, this can take up to a minute...");
        }
        self.cold_start_announced = waking;
    }
}

/// Anything but an explicit yes, including a closed stdin, is a no.
fn confirm(question: &str) -> bool {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{question}");
    let _ = stderr.flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lens_core::{MemoryContextStore, NavigationContext, SearchQuery, UserIdentity};
    use lens_engine::{ApiConfig, EngineSettings, ReqwestApiClient};

    use super::*;

    fn unconfigured_app() -> App {
        let api = ReqwestApiClient::new(ApiConfig::default()).unwrap();
        let engine = EngineHandle::new(Arc::new(api), EngineSettings::default()).unwrap();
        let store = MemoryContextStore::default();
        store.save(&NavigationContext {
            last_submissions_query: Some("status=failed".into()),
            ..NavigationContext::default()
        });
        App::new(
            engine,
            Box::new(store),
            WorkflowTimings::default(),
            DuplicatePolicy::Abort,
        )
    }

    #[test]
    fn missing_configuration_settles_with_zero_stats() {
        let mut app = unconfigured_app();
        app.dispatch(Msg::StatsRequested);
        app.settle(Duration::from_secs(5)).unwrap();

        let stats = app.view().stats;
        assert_eq!(stats.stats.total_count, 0);
        assert_eq!(stats.error.unwrap().message, "Configuration error");
    }

    #[test]
    fn retry_lookup_leaves_the_saved_table_query_alone() {
        let mut app = unconfigured_app();
        app.dispatch(Msg::SignedIn(UserIdentity {
            email: "a@b.com".into(),
            is_admin: false,
        }));
        app.dispatch(Msg::SubmissionsLookupOpened(crate::commands::failed_lookup()));
        app.settle(Duration::from_secs(5)).unwrap();

        assert!(app.view().submissions_error.is_some());
        let saved = app.runner.store().load();
        assert_eq!(saved.last_submissions_query.as_deref(), Some("status=failed"));

        app.dispatch(Msg::SubmissionsLookupOpened(SearchQuery::default()));
        app.settle(Duration::from_secs(5)).unwrap();
        let saved = app.runner.store().load();
        assert_eq!(saved.last_submissions_query.as_deref(), Some("status=failed"));
    }

    #[test]
    fn stored_context_seeds_the_query() {
        let app = unconfigured_app();
        assert_eq!(app.view().query_string, "status=failed");
    }
}
