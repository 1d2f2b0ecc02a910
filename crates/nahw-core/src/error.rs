//! Error types for the nahw core library
//!
//! Defines the classified error taxonomy for the generation pipeline,
//! using thiserror for ergonomic error definitions and anyhow for
//! flexible error contexts. Each variant corresponds to one failure
//! class an HTTP-facing caller needs to distinguish: upstream
//! generation failures, unparseable model output, schema violations,
//! bad request input, and configuration problems.

use thiserror::Error;

use crate::schema::Violation;

/// Main error type for nahw operations
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream generation failure: retries exhausted or a
    /// non-retryable provider error
    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The model response could not be parsed as JSON after
    /// sanitization. Carries the sanitized text for diagnostics.
    #[error("AI response format invalid: {message}")]
    InvalidFormat {
        message: String,
        sanitized_text: String,
    },

    /// The parsed response does not conform to the declared schema.
    /// Carries the complete ordered list of violations, not just the
    /// first one found.
    #[error("Schema validation failed with {} violation(s)", violations.len())]
    SchemaViolations { violations: Vec<Violation> },

    /// Request input rejected before any generation call was made
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// JSON serialization errors outside the sanitizer path
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors (missing API key, bad repair config, ...)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Violations attached to a schema failure, if any
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Error::SchemaViolations { violations } => Some(violations),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
