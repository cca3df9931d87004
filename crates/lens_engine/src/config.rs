//! Connection settings for the document service.
//!
//! Nothing here is validated eagerly: a client built from an incomplete
//! config still starts, and each call fails with a configuration error.

use std::time::Duration;

use crate::ApiError;

pub const ENV_BASE_URL: &str = "LENS_API_BASE_URL";
pub const ENV_API_KEY: &str = "LENS_API_KEY";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LENS_REQUEST_TIMEOUT_SECS";

/// Header that carries the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Service root, e.g. `https://api.example.com`.
    /// Env: `LENS_API_BASE_URL`
    pub base_url: Option<String>,

    /// Sent as `X-API-Key`.
    /// Env: `LENS_API_KEY`
    pub api_key: Option<String>,

    pub connect_timeout: Duration,

    /// Whole-request timeout. Cold starts can be slow, keep this generous.
    /// Env: `LENS_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ApiConfig {
    /// Overlay environment variables on top of `self`. Empty values count as
    /// unset.
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(base_url) = get(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS).and_then(|v| v.trim().parse::<u64>().ok()) {
            self.request_timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Base URL and API key, or a configuration error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str), ApiError> {
        let base_url = non_blank(self.base_url.as_deref())
            .ok_or_else(|| ApiError::Configuration(format!("{ENV_BASE_URL} is not set")))?;
        let api_key = non_blank(self.api_key.as_deref())
            .ok_or_else(|| ApiError::Configuration(format!("{ENV_API_KEY} is not set")))?;
        Ok((base_url, api_key))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
