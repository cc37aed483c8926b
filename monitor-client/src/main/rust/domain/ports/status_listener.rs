use crate::domain::entities::StateTransition;

/// Receives every connection state change exactly once
pub trait StatusListener: Send + Sync {
    fn on_status_change(&self, transition: &StateTransition);
}

impl<F> StatusListener for F
where
    F: Fn(&StateTransition) + Send + Sync,
{
    fn on_status_change(&self, transition: &StateTransition) {
        self(transition)
    }
}
