use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid reconnect interval: must be greater than zero")]
    InvalidReconnectInterval,

    #[error("Invalid stream URL: {0}")]
    InvalidStreamUrl(String),

    #[error("Failed to open stream: {0}")]
    ConnectFailed(String),

    #[error("Stream transport failed: {0}")]
    TransportFailed(String),

    #[error("Streaming client has stopped")]
    ClientStopped,
}

pub type Result<T> = std::result::Result<T, DomainError>;
