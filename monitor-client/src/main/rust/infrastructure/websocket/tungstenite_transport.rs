use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{StreamConnection, StreamTransport, TransportEvent};

/// Websocket transport backed by tokio-tungstenite
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TungsteniteTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamTransport for TungsteniteTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn StreamConnection>> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| DomainError::ConnectFailed(e.to_string()))?;

        tracing::debug!(status = %response.status(), "Websocket handshake complete");
        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamConnection for TungsteniteConnection {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(TransportEvent::Text(text.to_string())),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                        None => (None, String::new()),
                    };
                    return Some(TransportEvent::Closed { code, reason });
                }
                // Pings are answered by tungstenite; binary frames carry nothing for us
                Ok(_) => continue,
                Err(e) => return Some(TransportEvent::Error(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "Client disconnecting".into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .map_err(|e| DomainError::TransportFailed(e.to_string()))
    }
}
