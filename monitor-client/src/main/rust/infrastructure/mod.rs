pub mod console;
pub mod metrics;
pub mod websocket;
