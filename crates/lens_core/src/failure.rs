/// Category of a failed operation as seen by the state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any request was made.
    Validation,
    /// The server answered with a non-success status.
    Api { status: u16 },
    /// The server could not be reached.
    Transport,
    /// Required deployment configuration is missing.
    Configuration,
    /// The server answered with a payload we could not understand.
    Decode,
    /// The request was abandoned by the caller.
    Cancelled,
    /// The server accepted the request but reported the submission as failed.
    Processing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Whether a "Try Again" affordance makes sense for this failure.
    pub fn retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Transport => true,
            ErrorKind::Api { status } => status >= 500,
            ErrorKind::Decode | ErrorKind::Processing => true,
            ErrorKind::Validation | ErrorKind::Configuration | ErrorKind::Cancelled => false,
        }
    }

    /// Text shown inline next to the control that triggered the operation.
    pub fn display_message(&self) -> String {
        match self.kind {
            ErrorKind::Transport => {
                "Unable to reach the server. Please try again.".to_string()
            }
            ErrorKind::Configuration => "Configuration error".to_string(),
            ErrorKind::Cancelled => "Request cancelled".to_string(),
            ErrorKind::Validation
            | ErrorKind::Api { .. }
            | ErrorKind::Decode
            | ErrorKind::Processing => {
                self.message.clone()
            }
        }
    }
}
