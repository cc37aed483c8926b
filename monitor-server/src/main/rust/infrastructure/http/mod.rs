mod routes;
mod websocket_observer;

pub use routes::{bind, routes, HttpState};
pub use websocket_observer::{serve_observer, WebSocketSink};
