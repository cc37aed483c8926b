mod observer_registration;

pub use observer_registration::{ObserverRegistration, ObserverState};
