use async_trait::async_trait;

use crate::domain::errors::Result;

/// Something that happened on an open stream connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Text(String),
    /// Close frame received; `code` is `None` if the frame carried no code
    Closed { code: Option<u16>, reason: String },
    Error(String),
}

/// Port for opening stream connections
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn StreamConnection>>;
}

/// One open stream connection
#[async_trait]
pub trait StreamConnection: Send {
    /// Next event, or `None` once the stream ended without a close frame.
    ///
    /// Must be cancel safe.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Close with a normal closure
    async fn close(&mut self) -> Result<()>;
}
