mod tungstenite_transport;

pub use tungstenite_transport::TungsteniteTransport;
