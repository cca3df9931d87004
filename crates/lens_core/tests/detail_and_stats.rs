use lens_core::{
    update, AppState, ContextStore, DocumentDetail, DocumentStats, DocumentType, Effect,
    ErrorKind, Failure, MemoryContextStore, Msg, NavigationContext,
};
use pretty_assertions::assert_eq;

fn detail(id: &str) -> DocumentDetail {
    DocumentDetail {
        id: id.to_string(),
        url: "https://example.com/terms".to_string(),
        document_type: DocumentType::Tos,
        company_name: Some("Example".to_string()),
        retrieved_url: None,
        one_sentence_summary: Some("You give up a lot.".to_string()),
        hundred_word_summary: None,
        scores: vec![("transparency".to_string(), 6.5)],
        key_points: vec!["Data is sold".to_string()],
        views: 3,
        created_at: None,
        updated_at: None,
    }
}

fn open(state: AppState, id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::DocumentOpened {
            document_id: id.to_string(),
            skip_view_increment: false,
        },
    )
}

#[test]
fn opening_another_document_cancels_the_pending_fetch() {
    let (state, effects) = open(AppState::new(), "d1");
    assert!(effects.contains(&Effect::FetchDocument {
        document_id: "d1".to_string(),
        skip_view_increment: false,
    }));

    let (state, effects) = open(state, "d2");
    assert_eq!(
        effects[0],
        Effect::CancelDocumentFetch {
            document_id: "d1".to_string()
        }
    );

    // The late result for d1 is discarded.
    let (state, _) = update(
        state,
        Msg::DocumentLoaded {
            document_id: "d1".to_string(),
            result: Ok(detail("d1")),
        },
    );
    assert!(state.view().detail.document.is_none());
    assert!(state.view().detail.loading);

    let (state, _) = update(
        state,
        Msg::DocumentLoaded {
            document_id: "d2".to_string(),
            result: Ok(detail("d2")),
        },
    );
    assert_eq!(state.view().detail.document.map(|d| d.id), Some("d2".to_string()));
}

#[test]
fn closing_cancels_and_cancelled_result_is_silent() {
    let (state, _) = open(AppState::new(), "d1");
    let (state, effects) = update(state, Msg::DocumentClosed);
    assert_eq!(
        effects,
        vec![Effect::CancelDocumentFetch {
            document_id: "d1".to_string()
        }]
    );

    let (state, _) = open(state, "d1");
    let (state, _) = update(
        state,
        Msg::DocumentLoaded {
            document_id: "d1".to_string(),
            result: Err(Failure::new(ErrorKind::Cancelled, "aborted")),
        },
    );
    let view = state.view();
    assert!(!view.detail.loading);
    assert!(view.detail.error.is_none());
}

#[test]
fn missing_configuration_shows_zero_stats() {
    let (state, effects) = update(AppState::new(), Msg::StatsRequested);
    assert_eq!(effects, vec![Effect::FetchStats]);

    let (state, effects) = update(state, Msg::StatsRequested);
    assert!(effects.is_empty(), "stats fetch is already running");

    let (state, _) = update(
        state,
        Msg::StatsLoaded(Err(Failure::new(
            ErrorKind::Configuration,
            "LENS_API_KEY is not set",
        ))),
    );
    let stats = state.view().stats;
    assert_eq!(stats.stats, DocumentStats::default());
    let error = stats.error.expect("error");
    assert_eq!(error.message, "Configuration error");
    assert!(!error.retryable);
}

#[test]
fn transport_failure_keeps_previous_stats() {
    let (state, _) = update(AppState::new(), Msg::StatsRequested);
    let loaded = DocumentStats {
        tos_count: 4,
        pp_count: 6,
        total_count: 10,
    };
    let (state, _) = update(state, Msg::StatsLoaded(Ok(loaded)));
    let (state, _) = update(state, Msg::RetryFetchClicked(lens_core::FetchTarget::Stats));
    let (state, _) = update(
        state,
        Msg::StatsLoaded(Err(Failure::new(ErrorKind::Transport, "offline"))),
    );

    let stats = state.view().stats;
    assert_eq!(stats.stats, loaded);
    assert!(stats.error.expect("error").retryable);
}

#[test]
fn navigation_context_is_persisted_on_page_transitions() {
    let store = MemoryContextStore::default();
    let (state, effects) = open(AppState::new(), "d7");
    for effect in &effects {
        if let Effect::PersistContext(context) = effect {
            store.save(context);
        }
    }
    assert_eq!(store.load().last_document_id.as_deref(), Some("d7"));

    // Reopening the same document does not write again.
    let (_state, effects) = open(state, "d7");
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::PersistContext(_))));
}

#[test]
fn restored_context_seeds_the_submissions_query() {
    let context = NavigationContext {
        last_search_text: Some("acme".to_string()),
        last_search_type: None,
        last_submissions_query: Some("status=failed&page=2".to_string()),
        last_document_id: None,
    };
    let (state, effects) = update(AppState::new(), Msg::RestoreContext(context.clone()));

    assert!(effects.is_empty());
    assert_eq!(state.query().page, 2);
    assert_eq!(state.navigation_snapshot(), context);
}
