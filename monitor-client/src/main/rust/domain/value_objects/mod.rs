mod connection_state;
mod reconnect_policy;

pub use connection_state::ConnectionState;
pub use reconnect_policy::ReconnectPolicy;
