//! Response sanitization
//!
//! Generation models habitually wrap JSON answers in Markdown code
//! fences. The sanitizer strips every fence marker anywhere in the
//! text, trims surrounding whitespace, and parses strictly. A parse
//! failure is deterministic, not transient, so the resulting error
//! never matches the retry policy's overload markers and propagates
//! immediately.

use serde_json::Value;

use crate::{Error, Result};

/// Strip code-fence markers and parse the remainder as JSON
///
/// Fence-free input round-trips untouched: sanitizing already-sanitized
/// text yields the same parsed value.
pub fn sanitize_and_parse(raw: &str) -> Result<Value> {
    let sanitized = strip_fences(raw);
    serde_json::from_str(&sanitized).map_err(|e| {
        log::error!("failed to parse AI response: {}", e);
        log::debug!("sanitized response text: {}", sanitized);
        Error::InvalidFormat {
            message: e.to_string(),
            sanitized_text: sanitized,
        }
    })
}

/// Remove all ```json / ``` markers and trim surrounding whitespace
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}
