use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid tick interval: must be greater than zero")]
    InvalidTickInterval,

    #[error("Metric source {source_name} failed: {reason}")]
    SourceFailed {
        source_name: &'static str,
        reason: String,
    },

    #[error("Failed to encode stream message: {0}")]
    EncodingFailed(#[from] monitor_shared::ProtocolError),

    #[error("Failed to bind HTTP server: {0}")]
    BindFailed(String),
}

impl DomainError {
    pub fn source_failed(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::SourceFailed {
            source_name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
