use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::snapshot::Snapshot;
use crate::domain::errors::{ProtocolError, Result};

pub const METRICS_UPDATE: &str = "metrics_update";
pub const ERROR: &str = "error";
pub const CONNECTION_STATUS: &str = "connection_status";

const UNSPECIFIED_ERROR: &str = "Unspecified stream error";

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ProtocolError::InvalidTimestamp(raw.to_string()))
}

/// Connection status reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusReport {
    Connected,
    Disconnected,
    Reconnecting,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    MetricsUpdate {
        snapshot: Snapshot,
        timestamp: DateTime<Utc>,
    },
    Error {
        reason: String,
        timestamp: DateTime<Utc>,
    },
    ConnectionStatus {
        status: StatusReport,
        timestamp: DateTime<Utc>,
    },
}

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(StreamMessage),
    /// Well-formed envelope with a tag this build does not know
    Unknown(String),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    timestamp: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusData {
    status: StatusReport,
}

impl StreamMessage {
    pub fn metrics_update(snapshot: Snapshot) -> Self {
        Self::MetricsUpdate {
            snapshot,
            timestamp: Utc::now(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn connection_status(status: StatusReport) -> Self {
        Self::ConnectionStatus {
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::MetricsUpdate { .. } => METRICS_UPDATE,
            Self::Error { .. } => ERROR,
            Self::ConnectionStatus { .. } => CONNECTION_STATUS,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MetricsUpdate { timestamp, .. }
            | Self::Error { timestamp, .. }
            | Self::ConnectionStatus { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize into the `{type, timestamp, data}` JSON envelope
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            Self::MetricsUpdate { snapshot, .. } => serde_json::to_value(snapshot)?,
            Self::Error { reason, .. } => json!({ "error": reason }),
            Self::ConnectionStatus { status, .. } => json!({ "status": status }),
        };
        let envelope = Envelope {
            kind: self.tag().to_string(),
            timestamp: format_timestamp(&self.timestamp()),
            data,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn decode(text: &str) -> Result<Decoded> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let message = match envelope.kind.as_str() {
            METRICS_UPDATE => {
                let snapshot = payload::<Snapshot>(METRICS_UPDATE, envelope.data)?;
                Self::MetricsUpdate {
                    snapshot,
                    timestamp: parse_timestamp(&envelope.timestamp)?,
                }
            }
            ERROR => {
                let data = payload::<ErrorData>(ERROR, envelope.data)?;
                Self::Error {
                    reason: data.error.unwrap_or_else(|| UNSPECIFIED_ERROR.to_string()),
                    timestamp: parse_timestamp(&envelope.timestamp)?,
                }
            }
            CONNECTION_STATUS => {
                let data = payload::<StatusData>(CONNECTION_STATUS, envelope.data)?;
                Self::ConnectionStatus {
                    status: data.status,
                    timestamp: parse_timestamp(&envelope.timestamp)?,
                }
            }
            _ => return Ok(Decoded::Unknown(envelope.kind)),
        };

        Ok(Decoded::Message(message))
    }
}

fn payload<T: serde::de::DeserializeOwned>(tag: &'static str, data: Value) -> Result<T> {
    // An absent `data` key arrives as Null; treat it as an empty object
    let data = if data.is_null() { json!({}) } else { data };
    serde_json::from_value(data).map_err(|e| ProtocolError::InvalidPayload {
        tag,
        reason: e.to_string(),
    })
}
