mod broadcast_config;
mod observer_id;

pub use broadcast_config::BroadcastConfig;
pub use observer_id::ObserverId;
