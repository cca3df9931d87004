use std::sync::mpsc;
use std::thread;

use lens_core::{ContextStore, Effect, Failure, Msg};
use lens_engine::{EngineCommand, EngineEvent, EngineHandle};
use lens_logging::{lens_debug, lens_info};

/// Executes core effects: IO goes to the engine, timers to sleeper threads,
/// persistence to the context store.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    store: Box<dyn ContextStore>,
    query_string: String,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>, store: Box<dyn ContextStore>) -> Self {
        Self {
            engine,
            msg_tx,
            store,
            query_string: String::new(),
        }
    }

    pub fn store(&self) -> &dyn ContextStore {
        self.store.as_ref()
    }

    /// Last query string the submissions table asked to show in its URL.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchSubmissions {
                    request_id,
                    query,
                    freshness,
                } => self.engine.send(EngineCommand::SearchSubmissions {
                    request_id,
                    query,
                    freshness,
                }),
                Effect::AdminSearchSubmissions { request_id, query } => self
                    .engine
                    .send(EngineCommand::AdminSearchSubmissions { request_id, query }),
                Effect::SearchDocuments { request_id, query } => self
                    .engine
                    .send(EngineCommand::SearchDocuments { request_id, query }),
                Effect::FetchDocument {
                    document_id,
                    skip_view_increment,
                } => self.engine.send(EngineCommand::FetchDocument {
                    document_id,
                    skip_view_increment,
                }),
                Effect::CancelDocumentFetch { document_id } => self
                    .engine
                    .send(EngineCommand::CancelDocument { document_id }),
                Effect::FetchStats => self.engine.send(EngineCommand::FetchStats),
                Effect::CheckDuplicate {
                    flow,
                    url,
                    document_type,
                    user_email,
                } => self.engine.send(EngineCommand::CheckDuplicate {
                    flow,
                    url,
                    document_type,
                    user_email,
                }),
                Effect::CreateSubmission(request) => {
                    lens_info!("CreateSubmission url={} type={}", request.url, request.document_type);
                    self.engine.send(EngineCommand::CreateSubmission(request));
                }
                Effect::RetrySubmission {
                    submission_id,
                    request,
                } => {
                    lens_info!("RetrySubmission id={}", submission_id);
                    self.engine.send(EngineCommand::RetrySubmission {
                        submission_id,
                        request,
                    });
                }
                Effect::InvalidateSearches => self.engine.send(EngineCommand::InvalidateSearches),
                Effect::SyncQueryString(query_string) => {
                    lens_debug!("query string -> ?{}", query_string);
                    self.query_string = query_string;
                }
                Effect::NavigateToDocument(document_id) => {
                    let _ = self.msg_tx.send(Msg::DocumentOpened {
                        document_id,
                        skip_view_increment: false,
                    });
                }
                Effect::PersistContext(context) => self.store.save(&context),
                Effect::Schedule { after, msg } => {
                    let msg_tx = self.msg_tx.clone();
                    thread::spawn(move || {
                        thread::sleep(after);
                        let _ = msg_tx.send(*msg);
                    });
                }
            }
        }
    }

    /// Next finished engine result, already translated into a message.
    pub fn poll_event(&self) -> Option<Msg> {
        self.engine.try_recv().map(event_to_msg)
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmissionsLoaded { request_id, result } => Msg::SubmissionsLoaded {
            request_id,
            result: result.map_err(Failure::from),
        },
        EngineEvent::DocumentsLoaded { request_id, result } => Msg::DocumentsLoaded {
            request_id,
            result: result.map_err(Failure::from),
        },
        EngineEvent::DocumentLoaded {
            document_id,
            result,
        } => Msg::DocumentLoaded {
            document_id,
            result: result.map_err(Failure::from),
        },
        EngineEvent::StatsLoaded(result) => Msg::StatsLoaded(result.map_err(Failure::from)),
        EngineEvent::DuplicateChecked { flow, result } => Msg::DuplicateChecked { flow, result },
        EngineEvent::SubmissionCreated(result) => Msg::SubmissionCreated {
            result: result.map_err(Failure::from),
        },
        EngineEvent::RetryFinished {
            submission_id,
            result,
        } => Msg::RetryFinished {
            submission_id,
            result: result.map_err(Failure::from),
        },
    }
}
