use std::sync::Once;

use lens_core::{
    update, AppState, DocumentType, DuplicateCheckResult, Effect, ErrorKind, Failure, FlowKey,
    Msg, SubmissionRecord, SubmissionRequest, SubmissionStatus, SubmitPhase, UserIdentity,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(lens_logging::initialize_for_tests);
}

fn signed_in(email: &str) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::SignedIn(UserIdentity {
            email: email.to_string(),
            is_admin: false,
        }),
    );
    state
}

fn submit(state: AppState, url: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::SubmitRequested {
            url: url.to_string(),
            document_type: DocumentType::Tos,
            document_url: None,
        },
    )
}

fn record(status: SubmissionStatus, document_id: Option<&str>, message: Option<&str>) -> SubmissionRecord {
    SubmissionRecord {
        id: "sub-1".to_string(),
        url: "example.com".to_string(),
        document_type: DocumentType::Tos,
        document_url: None,
        status,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
        document_id: document_id.map(str::to_string),
        user_email: "a@b.com".to_string(),
        error_message: message.map(str::to_string),
        duplicate: None,
    }
}

fn count_invalidations(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::InvalidateSearches))
        .count()
}

#[test]
fn submit_without_match_runs_every_phase_and_invalidates_once() {
    init_logging();
    let state = signed_in("a@b.com");

    let (state, effects) = submit(state, "example.com");
    assert_eq!(
        effects,
        vec![Effect::CheckDuplicate {
            flow: FlowKey::Create,
            url: "example.com".to_string(),
            document_type: DocumentType::Tos,
            user_email: "a@b.com".to_string(),
        }]
    );
    assert_eq!(state.view().create.phase, SubmitPhase::CheckingDuplicate);

    let (state, effects) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::CreateSubmission(SubmissionRequest {
            url: "example.com".to_string(),
            document_type: DocumentType::Tos,
            document_url: None,
            user_email: "a@b.com".to_string(),
        })]
    );

    let (state, effects) = update(
        state,
        Msg::SubmissionCreated {
            result: Ok(record(SubmissionStatus::Success, Some("doc-9"), None)),
        },
    );
    assert_eq!(count_invalidations(&effects), 1);
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::NavigateToDocument(_))));

    let view = state.view();
    assert_eq!(
        view.create.trace,
        vec![
            SubmitPhase::Idle,
            SubmitPhase::Validating,
            SubmitPhase::CheckingDuplicate,
            SubmitPhase::Submitting,
            SubmitPhase::Success,
        ]
    );
    assert_eq!(view.create.result_document_id.as_deref(), Some("doc-9"));
}

#[test]
fn queued_submission_counts_as_accepted() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "example.com");
    let (state, _) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );

    let (state, effects) = update(
        state,
        Msg::SubmissionCreated {
            result: Ok(record(SubmissionStatus::Processing, None, None)),
        },
    );
    assert_eq!(count_invalidations(&effects), 1);
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::NavigateToDocument(_))));

    let view = state.view();
    assert_eq!(view.create.phase, SubmitPhase::Success);
    assert_eq!(view.create.error, None);
    assert_eq!(view.create.result_document_id, None);
}

#[test]
fn submit_without_sign_in_fails_validation_and_sends_nothing() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "example.com");

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.create.phase, SubmitPhase::Idle);
    assert!(view.create.error.is_some());
}

#[test]
fn blank_url_is_rejected() {
    init_logging();
    let (state, effects) = submit(signed_in("a@b.com"), "   ");

    assert!(effects.is_empty());
    assert_eq!(state.view().create.phase, SubmitPhase::Idle);
}

#[test]
fn confirmed_duplicate_waits_for_user_and_abort_redirects() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "FACEBOOK.com/");
    let found = DuplicateCheckResult::found(Some("doc-fb".to_string()));

    let (state, effects) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: found.clone(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().create.pending_duplicate, Some(found));
    assert!(!state.view().busy);

    let (state, effects) = update(
        state,
        Msg::DuplicateDecision {
            flow: FlowKey::Create,
            proceed: false,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::NavigateToDocument("doc-fb".to_string())]
    );
    assert_eq!(state.view().create.phase, SubmitPhase::Idle);
}

#[test]
fn confirmed_duplicate_can_still_be_submitted() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "example.com");
    let (state, _) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::found(Some("doc-1".to_string())),
        },
    );
    let (state, effects) = update(
        state,
        Msg::DuplicateDecision {
            flow: FlowKey::Create,
            proceed: true,
        },
    );

    assert!(matches!(effects.as_slice(), [Effect::CreateSubmission(_)]));
    assert_eq!(state.view().create.phase, SubmitPhase::Submitting);
}

#[test]
fn duplicate_success_redirects_to_existing_document() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "example.com");
    let (state, _) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::SubmissionCreated {
            result: Ok(record(
                SubmissionStatus::Success,
                Some("doc-old"),
                Some("Document already exists"),
            )),
        },
    );

    assert_eq!(state.view().create.phase, SubmitPhase::Success);
    assert_eq!(
        effects,
        vec![
            Effect::InvalidateSearches,
            Effect::NavigateToDocument("doc-old".to_string()),
        ]
    );
}

#[test]
fn api_failure_surfaces_message_and_keeps_ui_usable() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "example.com");
    let (state, _) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::SubmissionCreated {
            result: Err(Failure::new(
                ErrorKind::Api { status: 422 },
                "URL is not reachable",
            )),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.create.phase, SubmitPhase::Error);
    assert_eq!(
        view.create.error.as_ref().map(|e| e.message.as_str()),
        Some("URL is not reachable")
    );

    // A new submission can be started right away.
    let (state, effects) = submit(state, "example.org");
    assert_eq!(effects.len(), 1);
    assert_eq!(state.view().create.phase, SubmitPhase::CheckingDuplicate);
}

#[test]
fn late_duplicate_result_after_reset_is_ignored() {
    init_logging();
    let (state, _) = submit(signed_in("a@b.com"), "example.com");
    let (state, _) = update(state, Msg::SubmitFormReset);
    // Reset is refused while the flow is running.
    assert_eq!(state.view().create.phase, SubmitPhase::CheckingDuplicate);

    let (state, _) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::DuplicateChecked {
            flow: FlowKey::Create,
            result: DuplicateCheckResult::none(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().create.phase, SubmitPhase::Submitting);
}
