use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid {tag} payload: {reason}")]
    InvalidPayload { tag: &'static str, reason: String },

    #[error("Invalid retry attempts: must be at least 1")]
    InvalidRetryAttempts,

    #[error("Invalid backoff multiplier: must be >= 1.0")]
    InvalidBackoffMultiplier,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failure categories for a remote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    Unauthorized,
    Forbidden,
    Http,
    Network,
    Timeout,
    MalformedPayload,
    Unsuccessful,
}

impl RequestErrorKind {
    /// Map a non-2xx status code to its kind
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            _ => Self::Http,
        }
    }

    /// Authentication and authorization failures are never retried
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Http => "http",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::MalformedPayload => "malformed payload",
            Self::Unsuccessful => "unsuccessful",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{endpoint} failed after {attempts} attempt(s) [{kind}]: {message}")]
pub struct RequestError {
    pub kind: RequestErrorKind,
    pub status_code: Option<u16>,
    pub endpoint: String,
    pub attempts: u32,
    pub message: String,
}

impl RequestError {
    pub fn new(
        kind: RequestErrorKind,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status_code: None,
            endpoint: endpoint.into(),
            attempts: 0,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}
