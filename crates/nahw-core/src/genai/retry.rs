//! Retry logic with exponential backoff for generation requests
//!
//! The backoff policy is a pure function of the attempt index and the
//! retry configuration; the invoker wraps an arbitrary asynchronous
//! operation and applies the policy on failure. Non-retryable errors
//! fail fast and the original error is always re-raised unwrapped, so
//! callers classify failures by inspecting the underlying error.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Message fragments that indicate a transient provider overload.
/// Matched case-insensitively against the error's display text.
pub const OVERLOAD_MARKERS: [&str; 4] =
    ["overloaded", "rate limit", "try again later", "timeout"];

/// Errors the invoker can classify for retry eligibility
pub trait RetryableError: std::fmt::Display {
    /// HTTP status code carried by the error, if any
    fn status_code(&self) -> Option<u16>;
}

/// Retry policy configuration
///
/// Immutable per invocation; the default mirrors the generation
/// service's production settings.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial call
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Status codes that trigger a retry
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            retryable_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with a custom attempt budget
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Decide whether an error is worth retrying
    ///
    /// Retryable errors either carry a status code from the retryable
    /// set or mention a transient-overload marker in their message.
    /// Everything else (malformed requests, authentication failures,
    /// unparseable responses) fails fast.
    pub fn should_retry<E: RetryableError>(&self, error: &E) -> bool {
        if let Some(code) = error.status_code() {
            if self.retryable_status_codes.contains(&code) {
                return true;
            }
        }

        let message = error.to_string().to_lowercase();
        OVERLOAD_MARKERS.iter().any(|marker| message.contains(marker))
    }
}

/// Compute the backoff delay for a zero-based attempt index
///
/// `min(max_delay, initial_delay * backoff_factor^attempt)` with
/// multiplicative jitter in [0.8, 1.2] so concurrent requests do not
/// retry in lockstep.
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.8..=1.2);
    unjittered_delay(attempt, config).mul_f64(jitter)
}

/// The deterministic part of the backoff curve
pub(crate) fn unjittered_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential =
        config.initial_delay.as_secs_f64() * config.backoff_factor.powi(attempt as i32);
    Duration::from_secs_f64(exponential.min(config.max_delay.as_secs_f64()))
}

/// Execute an asynchronous operation with retry logic
///
/// Attempts the operation up to `max_retries + 1` times. On failure the
/// error is re-raised as-is once the budget is exhausted or the error
/// is classified non-retryable; otherwise the task suspends for the
/// backoff delay and tries again. The operation is invoked exactly once
/// per attempt and is never deduplicated or cached.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                log::warn!(
                    "generation request failed (attempt {}/{}): {}",
                    attempt + 1,
                    config.max_retries + 1,
                    error
                );

                if attempt >= config.max_retries || !config.should_retry(&error) {
                    return Err(error);
                }

                let delay = backoff_delay(attempt, config);
                log::debug!("retrying after {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::error::GenAiError;
    use proptest::prelude::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct TestError {
        status: Option<u16>,
        message: &'static str,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl RetryableError for TestError {
        fn status_code(&self) -> Option<u16> {
            self.status
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig::new(max_retries)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(4))
    }

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert_eq!(config.retryable_status_codes, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn test_retryable_status_codes() {
        let config = RetryConfig::default();
        for code in [429, 500, 502, 503, 504] {
            let error = TestError { status: Some(code), message: "provider error" };
            assert!(config.should_retry(&error), "status {code} should retry");
        }
        for code in [400, 401, 403, 404] {
            let error = TestError { status: Some(code), message: "provider error" };
            assert!(!config.should_retry(&error), "status {code} should not retry");
        }
    }

    #[test]
    fn test_overload_markers_are_case_insensitive() {
        let config = RetryConfig::default();
        let error = TestError { status: None, message: "The model is OVERLOADED" };
        assert!(config.should_retry(&error));

        let error = TestError { status: None, message: "Rate limit exceeded" };
        assert!(config.should_retry(&error));

        let error = TestError { status: None, message: "invalid API key" };
        assert!(!config.should_retry(&error));
    }

    #[test]
    fn test_format_error_is_not_retryable() {
        let config = RetryConfig::default();
        let error = crate::Error::InvalidFormat {
            message: "expected value at line 1 column 1".to_string(),
            sanitized_text: "not json".to_string(),
        };
        let message = error.to_string().to_lowercase();
        assert!(!OVERLOAD_MARKERS.iter().any(|m| message.contains(m)));
        let _ = config;
    }

    #[test]
    fn test_should_retry_real_provider_error() {
        let config = RetryConfig::default();
        let overload = GenAiError::from_response(
            503,
            r#"{"error": {"message": "The model is overloaded"}}"#,
        );
        assert!(config.should_retry(&overload));

        let bad_request = GenAiError::from_response(400, r#"{"message": "bad prompt"}"#);
        assert!(!config.should_retry(&bad_request));
    }

    #[test]
    fn test_unjittered_delay_curve() {
        let config = RetryConfig::default();
        assert_eq!(unjittered_delay(0, &config), Duration::from_secs(1));
        assert_eq!(unjittered_delay(1, &config), Duration::from_secs(2));
        assert_eq!(unjittered_delay(2, &config), Duration::from_secs(4));
        assert_eq!(unjittered_delay(3, &config), Duration::from_secs(8));
        // Capped at max_delay from here on
        assert_eq!(unjittered_delay(4, &config), Duration::from_secs(10));
        assert_eq!(unjittered_delay(10, &config), Duration::from_secs(10));
    }

    proptest! {
        #[test]
        fn prop_jittered_delay_within_20_percent(attempt in 0u32..16) {
            let config = RetryConfig::default();
            let base = unjittered_delay(attempt, &config);
            let jittered = backoff_delay(attempt, &config);
            prop_assert!(jittered >= base.mul_f64(0.8));
            prop_assert!(jittered <= base.mul_f64(1.2));
        }

        #[test]
        fn prop_unjittered_delay_monotone(attempt in 0u32..15) {
            let config = RetryConfig::default();
            prop_assert!(
                unjittered_delay(attempt + 1, &config) >= unjittered_delay(attempt, &config)
            );
        }
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        // Fails with a retryable error on attempts 0..k-1, succeeds on
        // attempt k: the invoker returns the value after k+1 calls.
        for k in 0..=3u32 {
            let calls = Cell::new(0u32);
            let result: Result<&str, TestError> = with_retry(
                || {
                    let n = calls.get();
                    calls.set(n + 1);
                    async move {
                        if n < k {
                            Err(TestError { status: Some(503), message: "unavailable" })
                        } else {
                            Ok("generated")
                        }
                    }
                },
                &fast_config(3),
            )
            .await;

            assert_eq!(result.unwrap(), "generated");
            assert_eq!(calls.get(), k + 1);
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let calls = Cell::new(0u32);
        let result: Result<&str, TestError> = with_retry(
            || {
                calls.set(calls.get() + 1);
                async { Err(TestError { status: Some(400), message: "malformed request" }) }
            },
            &fast_config(5),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.status_code(), Some(400));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_reraise_last_error() {
        let calls = Cell::new(0u32);
        let result: Result<&str, TestError> = with_retry(
            || {
                calls.set(calls.get() + 1);
                async { Err(TestError { status: Some(503), message: "still overloaded" }) }
            },
            &fast_config(2),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.status_code(), Some(503));
        // max_retries + 1 total calls, never more
        assert_eq!(calls.get(), 3);
    }
}
