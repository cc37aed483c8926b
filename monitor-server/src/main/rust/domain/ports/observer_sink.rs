use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// The transport is gone; the observer must be removed
    #[error("observer transport closed")]
    Closed,

    /// Transient failure; the observer stays registered
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Port for the outbound half of an observer's transport
#[async_trait]
pub trait ObserverSink: Send + Sync {
    async fn send(&self, text: String) -> Result<(), DeliveryError>;
}
