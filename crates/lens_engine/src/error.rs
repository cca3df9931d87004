use lens_core::{ErrorKind, Failure};
use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode(message.into())
    }

    /// Worth repeating the same request later.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(message) => Failure::new(ErrorKind::Validation, message),
            ApiError::Api { status, message } => Failure::new(ErrorKind::Api { status }, message),
            ApiError::Transport(message) => Failure::new(ErrorKind::Transport, message),
            ApiError::Configuration(message) => Failure::new(ErrorKind::Configuration, message),
            ApiError::Decode(message) => Failure::new(ErrorKind::Decode, message),
            ApiError::Cancelled => Failure::new(ErrorKind::Cancelled, "request cancelled"),
        }
    }
}
