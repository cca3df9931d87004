//! Keyed, single-flight cache for read queries.
//!
//! At most one network request per key is in flight; concurrent readers of
//! the same key await the same shared future. A completed result is served
//! from memory until the deduping interval elapses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use lens_core::Freshness;
use lens_logging::{lens_debug, lens_trace};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub revalidate_on_focus: bool,
    pub revalidate_on_mount: bool,
    /// Identical queries within this window share one response.
    pub deduping_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            revalidate_on_focus: false,
            revalidate_on_mount: true,
            deduping_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Canonical key: `"{operation}:{params}"` with object keys sorted
/// recursively and null fields dropped, so equal queries always collide.
pub fn cache_key<P>(operation: &str, params: &P) -> Result<String, ApiError>
where
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(params)
        .map_err(|err| ApiError::Validation(format!("unserializable query: {err}")))?;
    let mut key = String::with_capacity(operation.len() + 64);
    key.push_str(operation);
    key.push(':');
    write_canonical(&value, &mut key);
    Ok(key)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().filter(|(_, v)| !v.is_null()).collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (index, (name, field)) in fields.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, ApiError>>>;

struct Entry<T> {
    data: Option<T>,
    error: Option<ApiError>,
    fetched_at: Option<Instant>,
    in_flight: Option<(u64, SharedFetch<T>)>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            in_flight: None,
        }
    }
}

struct Inner<T> {
    entries: HashMap<String, Entry<T>>,
    next_fetch: u64,
}

/// Observable state of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// No data yet and a request is running.
    pub is_loading: bool,
    /// A request is running, with or without data.
    pub is_validating: bool,
    pub error: Option<ApiError>,
}

pub struct QueryCache<T> {
    policy: CachePolicy,
    inner: Mutex<Inner<T>>,
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_fetch: 0,
            }),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `key` from memory or run `fetcher`, depending on `freshness` and
    /// the policy. A request already in flight for `key` is always joined.
    pub async fn fetch<F, Fut>(&self, key: &str, freshness: Freshness, fetcher: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (fetch_id, pending) = {
            let mut inner = self.lock();
            let next_fetch = inner.next_fetch;
            let entry = inner.entries.entry(key.to_string()).or_default();

            if let Some((fetch_id, pending)) = &entry.in_flight {
                lens_trace!("cache join {key}");
                (*fetch_id, pending.clone())
            } else {
                if let Some(data) = self.servable(entry, freshness) {
                    lens_trace!("cache hit {key}");
                    return Ok(data);
                }
                lens_debug!("cache miss {key} ({freshness:?})");
                let pending = fetcher().boxed().shared();
                entry.in_flight = Some((next_fetch, pending.clone()));
                inner.next_fetch += 1;
                (next_fetch, pending)
            }
        };

        let result = pending.await;

        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            let owns_flight = matches!(&entry.in_flight, Some((id, _)) if *id == fetch_id);
            if owns_flight {
                entry.in_flight = None;
                match &result {
                    Ok(data) => {
                        entry.data = Some(data.clone());
                        entry.error = None;
                        entry.fetched_at = Some(Instant::now());
                    }
                    Err(err) => entry.error = Some(err.clone()),
                }
            }
        }
        result
    }

    fn servable(&self, entry: &Entry<T>, freshness: Freshness) -> Option<T> {
        let data = entry.data.as_ref()?;
        let revalidate = match freshness {
            Freshness::Cached => {
                let fresh = entry
                    .fetched_at
                    .is_some_and(|at| at.elapsed() < self.policy.deduping_interval);
                !fresh
            }
            Freshness::Mount => self.policy.revalidate_on_mount,
            Freshness::Focus => self.policy.revalidate_on_focus,
            Freshness::Force => true,
        };
        (!revalidate).then(|| data.clone())
    }

    pub fn state(&self, key: &str) -> QueryState<T> {
        let inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) => QueryState {
                data: entry.data.clone(),
                is_loading: entry.in_flight.is_some() && entry.data.is_none(),
                is_validating: entry.in_flight.is_some(),
                error: entry.error.clone(),
            },
            None => QueryState {
                data: None,
                is_loading: false,
                is_validating: false,
                error: None,
            },
        }
    }

    /// Evict `key`. A request still in flight for it completes for its
    /// waiters but is not stored; the next read goes to the network.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.lock().entries.remove(key).is_some();
        if removed {
            lens_debug!("cache invalidate {key}");
        }
        removed
    }

    /// Evict every key starting with `prefix`; returns how many were dropped.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        let evicted = before - inner.entries.len();
        lens_debug!("cache invalidate prefix {prefix}: {evicted} entries");
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
