use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::stream_message::format_timestamp;

/// Envelope returned by every REST endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: format_timestamp(&Utc::now()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: format_timestamp(&Utc::now()),
        }
    }

    /// Payload of a successful response, or the reported error
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("Response marked successful but carried no data".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}
