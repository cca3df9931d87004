//! Optional `ron` settings file with environment overrides for the API.
//!
//! ```ron
//! (
//!     api: (base_url: Some("https://api.example.com"), request_timeout_secs: 90),
//!     retry: ExponentialBackoff(max_attempts: 4, base_delay_ms: 250, max_delay_ms: 4000),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lens_core::WorkflowTimings;
use lens_engine::{ApiConfig, CachePolicy, EngineSettings, ExponentialBackoff, NoRetry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_SETTINGS_FILE: &str = "lens.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub retry: RetrySettings,
    pub timings: TimingSettings,
    /// Where the navigation context is kept. Defaults to `./.lens`.
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: Option<String>,
    /// Prefer `LENS_API_KEY` over writing the key into a file.
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        let defaults = ApiConfig::default();
        Self {
            base_url: None,
            api_key: None,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub revalidate_on_focus: bool,
    pub revalidate_on_mount: bool,
    pub deduping_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let policy = CachePolicy::default();
        Self {
            revalidate_on_focus: policy.revalidate_on_focus,
            revalidate_on_mount: policy.revalidate_on_mount,
            deduping_interval_secs: policy.deduping_interval.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetrySettings {
    #[default]
    None,
    ExponentialBackoff {
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub success_reset_ms: u64,
    pub error_reset_ms: u64,
    pub cold_start_notice_ms: u64,
    pub search_debounce_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        let timings = WorkflowTimings::default();
        Self {
            success_reset_ms: millis(timings.success_reset),
            error_reset_ms: millis(timings.error_reset),
            cold_start_notice_ms: millis(timings.cold_start_notice),
            search_debounce_ms: millis(timings.search_debounce),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Read `path`, or `lens.ron` in the working directory if it exists, or
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_SETTINGS_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// File values overlaid with `LENS_*` environment variables.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api.base_url.clone(),
            api_key: self.api.api_key.clone(),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
        }
        .with_env()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let cache_policy = CachePolicy {
            revalidate_on_focus: self.cache.revalidate_on_focus,
            revalidate_on_mount: self.cache.revalidate_on_mount,
            deduping_interval: Duration::from_secs(self.cache.deduping_interval_secs),
        };
        let retry: Arc<dyn lens_engine::RetryStrategy> = match self.retry {
            RetrySettings::None => Arc::new(NoRetry),
            RetrySettings::ExponentialBackoff {
                max_attempts,
                base_delay_ms,
                max_delay_ms,
            } => Arc::new(ExponentialBackoff {
                max_attempts: max_attempts.max(1),
                base_delay: Duration::from_millis(base_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms),
            }),
        };
        EngineSettings {
            cache_policy,
            retry,
        }
    }

    pub fn timings(&self) -> WorkflowTimings {
        WorkflowTimings {
            success_reset: Duration::from_millis(self.timings.success_reset_ms),
            error_reset: Duration::from_millis(self.timings.error_reset_ms),
            cold_start_notice: Duration::from_millis(self.timings.cold_start_notice_ms),
            search_debounce: Duration::from_millis(self.timings.search_debounce_ms),
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".lens")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lens.ron");
        fs::write(
            &path,
            r#"(
                api: (base_url: Some("https://api.example.com"), request_timeout_secs: 90),
                retry: ExponentialBackoff(max_attempts: 4, base_delay_ms: 250, max_delay_ms: 4000),
                timings: (search_debounce_ms: 100),
            )"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(settings.api.request_timeout_secs, 90);
        assert_eq!(settings.api.connect_timeout_secs, 10);
        assert_eq!(settings.cache, CacheSettings::default());
        assert_eq!(settings.timings().search_debounce, Duration::from_millis(100));
        assert_eq!(settings.timings().success_reset, Duration::from_millis(1500));
        assert_eq!(
            settings.retry,
            RetrySettings::ExponentialBackoff {
                max_attempts: 4,
                base_delay_ms: 250,
                max_delay_ms: 4000
            }
        );
    }

    #[test]
    fn defaults_match_the_engine() {
        let settings = Settings::default();
        assert_eq!(settings.engine_settings().cache_policy, CachePolicy::default());
        assert_eq!(settings.timings(), WorkflowTimings::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(api: [").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let result = Settings::load(Some(&temp.path().join("absent.ron")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
