//! Submission and retry workflows.
//!
//! Create flow: `Idle -> Validating -> CheckingDuplicate -> Submitting ->
//! {Success | Error}`. Retry flow, one session per submission id:
//! `Idle -> CheckingDuplicate -> Retrying -> {Success | Error} -> Idle`.
//! A confirmed duplicate parks the flow in `CheckingDuplicate` until the user
//! decides to proceed or abort.

use std::collections::{BTreeMap, BTreeSet};

use lens_logging::lens_debug;

use crate::failure::{ErrorKind, Failure};
use crate::model::{
    DocumentId, DocumentType, DuplicateCheckResult, RetryRequest, SubmissionId,
    SubmissionRecord, SubmissionRequest, SubmissionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    CheckingDuplicate,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPhase {
    #[default]
    Idle,
    CheckingDuplicate,
    Retrying,
    Success,
    Error,
}

/// Which workflow a duplicate check belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowKey {
    Create,
    Retry(SubmissionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Pre-flight validation failed; nothing was sent.
    Validation(String),
    /// The failed submission has no document URL and none was supplied.
    DocumentUrlRequired,
    /// The workflow is already running.
    Busy,
}

/// What to do after a duplicate check or a duplicate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateOutcome {
    /// Send the request.
    Proceed,
    /// A matching document exists; wait for the user.
    AwaitDecision(DuplicateCheckResult),
    /// The user gave up; show the existing document if known.
    Abort(Option<DocumentId>),
    /// The message does not apply to the current phase.
    Ignored,
}

/// Result of a finished create or retry request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Success {
        /// Set when the server resolved the submission to an existing
        /// document; the caller should show that document.
        redirect_to: Option<DocumentId>,
    },
    Error,
    Ignored,
}

fn is_running(phase: SubmitPhase) -> bool {
    matches!(
        phase,
        SubmitPhase::Validating | SubmitPhase::CheckingDuplicate | SubmitPhase::Submitting
    )
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateFlow {
    phase: SubmitPhase,
    trace: Vec<SubmitPhase>,
    request: Option<SubmissionRequest>,
    pending_duplicate: Option<DuplicateCheckResult>,
    record: Option<SubmissionRecord>,
    error: Option<Failure>,
}

impl CreateFlow {
    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    /// Phases visited since the last submit, starting with `Idle`.
    pub fn trace(&self) -> &[SubmitPhase] {
        &self.trace
    }

    pub fn request(&self) -> Option<&SubmissionRequest> {
        self.request.as_ref()
    }

    pub fn pending_duplicate(&self) -> Option<&DuplicateCheckResult> {
        self.pending_duplicate.as_ref()
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        self.record.as_ref()
    }

    pub fn error(&self) -> Option<&Failure> {
        self.error.as_ref()
    }

    pub fn is_running(&self) -> bool {
        is_running(self.phase) && self.pending_duplicate.is_none()
    }

    fn enter(&mut self, phase: SubmitPhase) {
        lens_debug!("submission flow: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.trace.push(phase);
    }

    /// Validate the form and move to `CheckingDuplicate`.
    pub fn begin(
        &mut self,
        url: &str,
        document_type: DocumentType,
        document_url: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<SubmissionRequest, WorkflowError> {
        if is_running(self.phase) {
            return Err(WorkflowError::Busy);
        }
        self.trace = vec![SubmitPhase::Idle];
        self.phase = SubmitPhase::Idle;
        self.pending_duplicate = None;
        self.record = None;
        self.error = None;

        let url = url.trim();
        let email = non_empty(user_email);
        let reason = if url.is_empty() {
            Some("Please enter a URL")
        } else if email.is_none() {
            Some("Please sign in to submit a document")
        } else {
            None
        };
        if let Some(reason) = reason {
            self.error = Some(Failure::validation(reason));
            return Err(WorkflowError::Validation(reason.to_string()));
        }

        self.enter(SubmitPhase::Validating);
        let request = SubmissionRequest {
            url: url.to_string(),
            document_type,
            document_url: non_empty(document_url),
            user_email: email.unwrap_or_default(),
        };
        self.request = Some(request.clone());
        self.enter(SubmitPhase::CheckingDuplicate);
        Ok(request)
    }

    pub fn duplicate_checked(&mut self, result: DuplicateCheckResult) -> DuplicateOutcome {
        if self.phase != SubmitPhase::CheckingDuplicate || self.pending_duplicate.is_some() {
            return DuplicateOutcome::Ignored;
        }
        if result.exists {
            self.pending_duplicate = Some(result.clone());
            return DuplicateOutcome::AwaitDecision(result);
        }
        self.enter(SubmitPhase::Submitting);
        DuplicateOutcome::Proceed
    }

    pub fn resolve_duplicate(&mut self, proceed: bool) -> DuplicateOutcome {
        let Some(pending) = self.pending_duplicate.take() else {
            return DuplicateOutcome::Ignored;
        };
        if proceed {
            self.enter(SubmitPhase::Submitting);
            DuplicateOutcome::Proceed
        } else {
            self.enter(SubmitPhase::Idle);
            DuplicateOutcome::Abort(pending.document_id)
        }
    }

    pub fn finish(&mut self, result: Result<SubmissionRecord, Failure>) -> FinishOutcome {
        if self.phase != SubmitPhase::Submitting {
            return FinishOutcome::Ignored;
        }
        match result {
            Ok(record) if record.status == SubmissionStatus::Failed => {
                let message = record
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Submission failed".to_string());
                self.error = Some(Failure::new(ErrorKind::Processing, message));
                self.record = Some(record);
                self.enter(SubmitPhase::Error);
                FinishOutcome::Error
            }
            // Initialized and processing records were accepted and queued;
            // the analysis finishes on the server.
            Ok(record) => {
                let redirect_to = if record.is_duplicate_success() {
                    record.document_id.clone()
                } else {
                    None
                };
                self.record = Some(record);
                self.enter(SubmitPhase::Success);
                FinishOutcome::Success { redirect_to }
            }
            Err(failure) => {
                self.error = Some(failure);
                self.enter(SubmitPhase::Error);
                FinishOutcome::Error
            }
        }
    }

    /// Back to an empty form.
    pub fn reset(&mut self) {
        *self = CreateFlow::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySession {
    phase: RetryPhase,
    generation: u64,
    request: RetryRequest,
    pending_duplicate: Option<DuplicateCheckResult>,
    result_document_id: Option<DocumentId>,
    error_message: Option<String>,
}

impl RetrySession {
    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &RetryRequest {
        &self.request
    }

    pub fn pending_duplicate(&self) -> Option<&DuplicateCheckResult> {
        self.pending_duplicate.as_ref()
    }

    pub fn result_document_id(&self) -> Option<&str> {
        self.result_document_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn is_running(&self) -> bool {
        matches!(self.phase, RetryPhase::CheckingDuplicate | RetryPhase::Retrying)
    }

    fn enter(&mut self, id: &str, phase: RetryPhase) {
        lens_debug!("retry {id}: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Inputs for the duplicate check that opens a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStart {
    pub submission_id: SubmissionId,
    pub url: String,
    pub document_type: DocumentType,
    pub user_email: String,
}

/// Retry sessions keyed by submission id; sessions never share state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryBoard {
    sessions: BTreeMap<SubmissionId, RetrySession>,
    needs_document_url: BTreeSet<SubmissionId>,
    next_generation: u64,
}

impl RetryBoard {
    pub fn session(&self, id: &str) -> Option<&RetrySession> {
        self.sessions.get(id)
    }

    pub fn phase(&self, id: &str) -> RetryPhase {
        self.sessions
            .get(id)
            .map(RetrySession::phase)
            .unwrap_or_default()
    }

    pub fn needs_document_url(&self, id: &str) -> bool {
        self.needs_document_url.contains(id)
    }

    pub fn any_running(&self) -> bool {
        self.sessions
            .values()
            .any(|s| s.is_running() && s.pending_duplicate.is_none())
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.needs_document_url.clear();
    }

    /// Open a retry for a failed submission.
    ///
    /// The document URL comes from `supplied_document_url` or, failing that,
    /// from the record. Without either nothing is sent and the id is flagged
    /// as needing input.
    pub fn begin(
        &mut self,
        record: &SubmissionRecord,
        supplied_document_url: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<RetryStart, WorkflowError> {
        if self.sessions.get(&record.id).is_some_and(RetrySession::is_running) {
            return Err(WorkflowError::Busy);
        }
        let Some(user_email) = non_empty(user_email) else {
            return Err(WorkflowError::Validation(
                "Please sign in to retry a submission".to_string(),
            ));
        };
        let document_url =
            non_empty(supplied_document_url).or_else(|| non_empty(record.document_url.as_deref()));
        let Some(document_url) = document_url else {
            self.needs_document_url.insert(record.id.clone());
            return Err(WorkflowError::DocumentUrlRequired);
        };
        self.needs_document_url.remove(&record.id);

        self.next_generation += 1;
        lens_debug!("retry {}: checking for duplicates", record.id);
        self.sessions.insert(
            record.id.clone(),
            RetrySession {
                phase: RetryPhase::CheckingDuplicate,
                generation: self.next_generation,
                request: RetryRequest {
                    document_url: Some(document_url),
                    user_email: user_email.clone(),
                },
                pending_duplicate: None,
                result_document_id: None,
                error_message: None,
            },
        );
        Ok(RetryStart {
            submission_id: record.id.clone(),
            url: record.url.clone(),
            document_type: record.document_type,
            user_email,
        })
    }

    pub fn duplicate_checked(&mut self, id: &str, result: DuplicateCheckResult) -> DuplicateOutcome {
        let Some(session) = self.sessions.get_mut(id) else {
            return DuplicateOutcome::Ignored;
        };
        if session.phase != RetryPhase::CheckingDuplicate || session.pending_duplicate.is_some() {
            return DuplicateOutcome::Ignored;
        }
        if result.exists {
            session.pending_duplicate = Some(result.clone());
            return DuplicateOutcome::AwaitDecision(result);
        }
        session.enter(id, RetryPhase::Retrying);
        DuplicateOutcome::Proceed
    }

    pub fn resolve_duplicate(&mut self, id: &str, proceed: bool) -> DuplicateOutcome {
        let Some(session) = self.sessions.get_mut(id) else {
            return DuplicateOutcome::Ignored;
        };
        let Some(pending) = session.pending_duplicate.take() else {
            return DuplicateOutcome::Ignored;
        };
        if proceed {
            session.enter(id, RetryPhase::Retrying);
            DuplicateOutcome::Proceed
        } else {
            self.sessions.remove(id);
            DuplicateOutcome::Abort(pending.document_id)
        }
    }

    pub fn finish(&mut self, id: &str, result: Result<&SubmissionRecord, &Failure>) -> FinishOutcome {
        let Some(session) = self.sessions.get_mut(id) else {
            return FinishOutcome::Ignored;
        };
        if session.phase != RetryPhase::Retrying {
            return FinishOutcome::Ignored;
        }
        match result {
            Ok(record) if record.status == SubmissionStatus::Failed => {
                session.enter(id, RetryPhase::Error);
                session.error_message = Some(
                    record
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Retry failed".to_string()),
                );
                FinishOutcome::Error
            }
            // Accepted for reprocessing, even if not finished yet.
            Ok(record) => {
                session.enter(id, RetryPhase::Success);
                session.result_document_id = record.document_id.clone();
                let redirect_to = if record.is_duplicate_success() {
                    record.document_id.clone()
                } else {
                    None
                };
                FinishOutcome::Success { redirect_to }
            }
            Err(failure) => {
                session.enter(id, RetryPhase::Error);
                session.error_message = Some(failure.display_message());
                FinishOutcome::Error
            }
        }
    }

    /// Drop a finished session once its display delay has passed. Timers from
    /// an older generation are ignored.
    pub fn reset_elapsed(&mut self, id: &str, generation: u64) -> bool {
        let matches = self.sessions.get(id).is_some_and(|s| {
            s.generation == generation && matches!(s.phase, RetryPhase::Success | RetryPhase::Error)
        });
        if matches {
            self.sessions.remove(id);
        }
        matches
    }
}
