mod connection_lifecycle;
mod snapshot_cache;

pub use connection_lifecycle::{
    ConnectionLifecycle, LifecycleAction, StateTransition, NORMAL_CLOSURE,
};
pub use snapshot_cache::LatestSnapshot;
