//! Generation-service error classification and normalization
//!
//! Normalizes provider error responses into a uniform error format that
//! preserves enough information (status code, message) for the retry
//! policy's eligibility check.

use serde_json::Value;
use std::fmt;

/// Classification of provider errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Client errors (4xx other than auth/rate-limit)
    ClientError,
    /// Server errors (5xx)
    ServerError,
    /// Transport-level errors (connect failures, timeouts)
    NetworkError,
    /// Rate limiting (429)
    RateLimited,
    /// Authentication errors (401/403)
    AuthenticationError,
    /// Anything else
    Unknown,
}

/// Normalized generation-service error
///
/// The status code and message are the two signals the backoff policy
/// inspects to decide retry eligibility, so both are preserved verbatim.
#[derive(Debug, Clone)]
pub struct GenAiError {
    /// HTTP status code if the provider responded at all
    pub status_code: Option<u16>,
    /// Error classification
    pub class: ErrorClass,
    /// Human-readable error message from the provider
    pub message: String,
    /// Parsed provider error body, when it was JSON
    pub details: Option<Value>,
}

impl GenAiError {
    /// Create from a non-success provider response
    pub fn from_response(status: u16, body: &str) -> Self {
        let details = serde_json::from_str::<Value>(body).ok();
        let message = Self::extract_provider_message(&details, body);

        Self {
            status_code: Some(status),
            class: Self::classify_status(status),
            message,
            details,
        }
    }

    /// Create from a transport-level request error
    pub fn from_request_error(error: reqwest::Error) -> Self {
        let class = if error.is_timeout() || error.is_connect() {
            ErrorClass::NetworkError
        } else {
            ErrorClass::Unknown
        };

        Self {
            status_code: error.status().map(|s| s.as_u16()),
            class,
            message: error.to_string(),
            details: None,
        }
    }

    /// Create an error for a response the provider reported as
    /// successful but whose body did not carry any generated text
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            class: ErrorClass::Unknown,
            message: message.into(),
            details: None,
        }
    }

    fn classify_status(status: u16) -> ErrorClass {
        match status {
            401 | 403 => ErrorClass::AuthenticationError,
            429 => ErrorClass::RateLimited,
            400..=499 => ErrorClass::ClientError,
            500..=599 => ErrorClass::ServerError,
            _ => ErrorClass::Unknown,
        }
    }

    /// Extract a message from the provider's error body
    ///
    /// The generateContent API wraps errors as
    /// `{"error": {"code": ..., "message": ..., "status": ...}}`;
    /// other shapes fall back to a top-level "message" or the raw body.
    fn extract_provider_message(details: &Option<Value>, body: &str) -> String {
        if let Some(json) = details {
            if let Some(message) = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                return message.to_string();
            }
            if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                return message.to_string();
            }
        }
        body.to_string()
    }
}

impl fmt::Display for GenAiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generation service error [{}]: {}",
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.message,
        )
    }
}

impl std::error::Error for GenAiError {}

impl From<GenAiError> for crate::Error {
    fn from(err: GenAiError) -> Self {
        let message = err.message.clone();
        let status_code = err.status_code;
        crate::Error::Generation {
            message,
            status_code,
            source: Some(anyhow::anyhow!(err)),
        }
    }
}
