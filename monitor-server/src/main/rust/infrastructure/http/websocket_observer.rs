use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use warp::ws::{Message, WebSocket};

use crate::application::services::BroadcastService;
use crate::domain::ports::{DeliveryError, ObserverSink};

/// Frames buffered per observer before further updates are dropped
const OUTBOUND_BUFFER: usize = 16;

/// Hands outgoing frames to the socket writer task without waiting on the network
pub struct WebSocketSink {
    tx: mpsc::Sender<Message>,
}

impl WebSocketSink {
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ObserverSink for WebSocketSink {
    async fn send(&self, text: String) -> Result<(), DeliveryError> {
        self.tx.try_send(Message::text(text)).map_err(|e| match e {
            TrySendError::Full(_) => {
                DeliveryError::Failed("observer is not keeping up; update dropped".to_string())
            }
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Drive one websocket observer from upgrade to close
pub async fn serve_observer(socket: WebSocket, service: Arc<BroadcastService>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sink, mut rx) = WebSocketSink::with_capacity(OUTBOUND_BUFFER);

    // Ends once every sender is dropped or the socket refuses a frame
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                tracing::debug!("Websocket write failed: {}", e);
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let id = match service.register(Arc::new(sink)).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Observer dropped before registration: {}", e);
            return;
        }
    };

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(message) if message.is_close() => {
                tracing::debug!(observer_id = %id, "Close frame received");
                break;
            }
            // Inbound frames carry no meaning
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(observer_id = %id, "Websocket read error: {}", e);
                break;
            }
        }
    }

    service.remove(id).await;
}
