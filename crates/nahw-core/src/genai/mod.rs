//! Generation-service integration
//!
//! This module provides everything between the pipeline and the
//! external model provider:
//! - A single-shot generation client and the `Generator` seam
//! - Error classification and normalization
//! - Retry logic with exponential backoff and jitter

pub mod client;
pub mod error;
pub mod retry;

pub use client::{ClientConfig, GenerationClient, Generator};
pub use error::{ErrorClass, GenAiError};
pub use retry::{backoff_delay, with_retry, RetryConfig, RetryableError, OVERLOAD_MARKERS};
