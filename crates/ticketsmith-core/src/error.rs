use std::fmt;
use thiserror::Error;

/// Whether a failed generation may be sent again unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network trouble or a timeout. The same request can be retried.
    Transient,
    /// Safety block, malformed request or bad credentials. Retrying the
    /// identical request will fail the same way.
    Rejected,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation failed ({kind}): {reason}")]
    GenerationFailed { kind: FailureKind, reason: String },

    #[error("A generation is already in flight")]
    Busy,

    #[error("No failed request to retry")]
    NothingToRetry,

    #[error("Retry refused: {0}")]
    RetryRefused(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TicketError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            kind: FailureKind::Rejected,
            reason: reason.into(),
        }
    }

    /// The failure kind when this is a backend failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::GenerationFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.failure_kind().is_some_and(FailureKind::is_retryable)
    }
}

/// Transport failures are transient. That includes a connection lost while
/// the reply body streams in, which reqwest reports as a body or decode
/// error. Malformed JSON is caught later, in `interpret_response`.
impl From<reqwest::Error> for TicketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout()
            || err.is_connect()
            || err.is_request()
            || err.is_body()
            || err.is_decode()
        {
            Self::transient(format!("HTTP transport error: {err}"))
        } else {
            Self::rejected(format!("HTTP error: {err}"))
        }
    }
}

pub type Result<T> = std::result::Result<T, TicketError>;
