//! Service error types.

use thiserror::Error;

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by the image, storage and catalog adapters.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required setting (API key, project URL) is missing.
    #[error("service not configured: {0} is not set")]
    NotConfigured(&'static str),

    /// A configured or derived URL is malformed.
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),

    /// Transport failure (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body was not the expected JSON.
    #[error("failed to parse service payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// The generation service rejected the API key.
    #[error("the image service rejected the API key")]
    ApiKeyRejected,

    /// The generation service refused the request on safety grounds.
    #[error("request blocked by the image service: {reason}")]
    SafetyBlocked {
        /// Block or finish reason reported by the service.
        reason: String,
    },

    /// The generation service answered without an image.
    #[error("the image service returned no image")]
    NoImage {
        /// Text the service returned instead, if any.
        text: Option<String>,
    },

    /// A response carried malformed data (bad base64, empty row set).
    #[error("invalid service payload: {0}")]
    InvalidPayload(String),

    /// A fetched resource was not an image.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}

impl ServiceError {
    /// Short machine-readable reason, used in logs and error slots.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Status { .. } => "status",
            Self::ApiKeyRejected => "api_key_rejected",
            Self::SafetyBlocked { .. } => "safety_blocked",
            Self::NoImage { .. } => "no_image",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::UnsupportedContentType(_) => "unsupported_content_type",
        }
    }
}

/// Pull a human-readable message out of an error body. Understands the
/// `{"error": {"message": ..}}`, `{"message": ..}` and `{"error": ".."}` shapes.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| body.trim().to_string(), str::to_string)
}
