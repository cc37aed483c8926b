use std::fmt;

/// Client connection states (pure domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection and none being attempted
    #[default]
    Disconnected,
    /// Transport open in progress
    Connecting,
    /// Transport open, receiving messages
    Connected,
    /// Waiting on the reconnect timer
    Reconnecting,
    /// Transport failure; sticky once the reconnect budget is spent
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl ConnectionState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Disconnected => 0.0,
            Self::Connecting => 1.0,
            Self::Connected => 2.0,
            Self::Reconnecting => 3.0,
            Self::Error => 4.0,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if state indicates a problem
    pub fn is_problematic(&self) -> bool {
        matches!(self, Self::Reconnecting | Self::Error)
    }
}
