use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lens_core::Freshness;
use lens_engine::{ApiError, CachePolicy, QueryCache};
use pretty_assertions::assert_eq;

const KEY: &str = "submissions/user:{\"page\":1}";

/// Fetcher that counts calls and answers `value` after `delay`.
fn counting(
    calls: &Arc<AtomicUsize>,
    value: u32,
    delay: Duration,
) -> impl FnOnce() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<u32, ApiError>> + Send>>
       + Send {
    let calls = calls.clone();
    move || {
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(value)
        })
    }
}

fn failing(
    calls: &Arc<AtomicUsize>,
) -> impl FnOnce() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<u32, ApiError>> + Send>>
       + Send {
    let calls = calls.clone();
    move || {
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Transport("offline".into()))
        })
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_reads_share_one_request() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    let (first, second) = tokio::join!(
        cache.fetch(KEY, Freshness::Cached, counting(&calls, 7, Duration::from_millis(200))),
        cache.fetch(KEY, Freshness::Cached, counting(&calls, 8, Duration::from_millis(200))),
    );

    assert_eq!(first, Ok(7));
    assert_eq!(second, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn results_are_reused_until_the_deduping_interval_passes() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.fetch(KEY, Freshness::Cached, counting(&calls, 1, Duration::ZERO)).await.unwrap();
    tokio::time::advance(Duration::from_secs(4 * 60)).await;
    let reused = cache.fetch(KEY, Freshness::Cached, counting(&calls, 2, Duration::ZERO)).await;
    assert_eq!(reused, Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(2 * 60)).await;
    let refreshed = cache.fetch(KEY, Freshness::Cached, counting(&calls, 3, Duration::ZERO)).await;
    assert_eq!(refreshed, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn mount_revalidates_and_focus_does_not() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.fetch(KEY, Freshness::Cached, counting(&calls, 1, Duration::ZERO)).await.unwrap();
    let focused = cache.fetch(KEY, Freshness::Focus, counting(&calls, 2, Duration::ZERO)).await;
    assert_eq!(focused, Ok(1));
    let mounted = cache.fetch(KEY, Freshness::Mount, counting(&calls, 3, Duration::ZERO)).await;
    assert_eq!(mounted, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn mount_serves_cache_when_revalidation_is_off() {
    let cache = QueryCache::new(CachePolicy {
        revalidate_on_mount: false,
        ..CachePolicy::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    cache.fetch(KEY, Freshness::Mount, counting(&calls, 1, Duration::ZERO)).await.unwrap();
    let mounted = cache.fetch(KEY, Freshness::Mount, counting(&calls, 2, Duration::ZERO)).await;
    assert_eq!(mounted, Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn force_joins_a_request_already_in_flight() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    let (first, forced) = tokio::join!(
        cache.fetch(KEY, Freshness::Cached, counting(&calls, 1, Duration::from_millis(100))),
        cache.fetch(KEY, Freshness::Force, counting(&calls, 2, Duration::ZERO)),
    );
    assert_eq!((first, forced), (Ok(1), Ok(1)));

    let again = cache.fetch(KEY, Freshness::Force, counting(&calls, 3, Duration::ZERO)).await;
    assert_eq!(again, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn state_reports_loading_then_data() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    let observe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.state(KEY)
    };
    let (_, during) = tokio::join!(
        cache.fetch(KEY, Freshness::Cached, counting(&calls, 5, Duration::from_millis(100))),
        observe,
    );
    assert!(during.is_loading);
    assert!(during.is_validating);

    let after = cache.state(KEY);
    assert_eq!(after.data, Some(5));
    assert!(!after.is_loading);
    assert!(!after.is_validating);
}

#[tokio::test(start_paused = true)]
async fn failed_revalidation_keeps_previous_data() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.fetch(KEY, Freshness::Cached, counting(&calls, 4, Duration::ZERO)).await.unwrap();
    let err = cache.fetch(KEY, Freshness::Force, failing(&calls)).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    let state = cache.state(KEY);
    assert_eq!(state.data, Some(4));
    assert_eq!(state.error, Some(err));
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_a_request_discards_its_result() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));

    let invalidate = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate(KEY)
    };
    let (result, evicted) = tokio::join!(
        cache.fetch(KEY, Freshness::Cached, counting(&calls, 1, Duration::from_millis(100))),
        invalidate,
    );
    assert_eq!(result, Ok(1));
    assert!(evicted);
    assert_eq!(cache.state(KEY).data, None);

    let next = cache.fetch(KEY, Freshness::Cached, counting(&calls, 2, Duration::ZERO)).await;
    assert_eq!(next, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn prefix_invalidation_only_touches_matching_keys() {
    let cache = QueryCache::new(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));
    for key in ["submissions/user:a", "submissions/admin:b", "documents:c"] {
        cache.fetch(key, Freshness::Cached, counting(&calls, 0, Duration::ZERO)).await.unwrap();
    }

    assert_eq!(cache.invalidate_by_prefix("submissions/"), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.state("documents:c").data, Some(0));
}
