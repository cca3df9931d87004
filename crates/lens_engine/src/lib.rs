//! Lens engine: HTTP client, query cache and background effect execution.
mod api;
mod cache;
mod config;
mod duplicate;
mod engine;
mod error;
mod persist;
mod retry;
mod types;
mod wire;

pub use api::{ApiClient, DocumentFetchOptions, ReqwestApiClient};
pub use cache::{cache_key, CachePolicy, QueryCache, QueryState};
pub use config::{
    ApiConfig, API_KEY_HEADER, ENV_API_KEY, ENV_BASE_URL, ENV_REQUEST_TIMEOUT_SECS,
};
pub use duplicate::{check_existing, DUPLICATE_SCAN_SIZE};
pub use engine::{EngineHandle, SUBMISSIONS_KEY_PREFIX};
pub use error::ApiError;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use retry::{with_retry, ExponentialBackoff, NoRetry, RetryStrategy};
pub use types::{EngineCommand, EngineEvent, EngineSettings};
