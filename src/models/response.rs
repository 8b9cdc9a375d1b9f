use chrono::{DateTime, Utc};
use serde::Serialize;

/// Uniform envelope for every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    pub timestamp: DateTime<Utc>,
}

/// Machine-readable error portion of the envelope.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::error_with_details(message, code, None)
    }

    pub fn error_with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(ErrorDetails {
                code: code.into(),
                details,
            }),
            timestamp: Utc::now(),
        }
    }
}
