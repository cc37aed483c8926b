use std::time::Duration;

use async_trait::async_trait;

/// Raw reply of one GET
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before any HTTP status was received
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    Network(String),
    Timeout(Duration),
}

/// Port for performing a single authenticated GET
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, bearer_token: &str) -> Result<HttpReply, TransportFailure>;
}
