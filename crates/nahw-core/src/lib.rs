//! # nahw-core
//!
//! Core generation pipeline for an Arabic grammar (نحو) learning
//! service. Turns prompts into validated, typed payloads by composing:
//!
//! - A retrying invoker with exponential backoff and jitter
//! - A Gemini generation client behind an injectable [`Generator`] trait
//! - A sanitizer that strips Markdown code fences from model output
//! - A best-effort shape repairer for enum-valued fields
//! - A declarative schema validator that reports every violation
//!
//! Domain operations (text analysis, quizzes, exercises, grammar
//! concepts) live under [`domains`] and drive the shared [`Pipeline`].
//!
//! ## Example
//!
//! ```no_run
//! use nahw_core::{ClientConfig, GenerationClient, Pipeline};
//! use nahw_core::domains::quiz::{self, QuizRequest};
//!
//! # async fn run() -> nahw_core::Result<()> {
//! let client = GenerationClient::from_env(ClientConfig::default())?;
//! let pipeline = Pipeline::new(client);
//!
//! let request = QuizRequest {
//!     topic: "الإعراب".to_string(),
//!     difficulty: "beginner".to_string(),
//!     question_count: 5,
//! };
//! let response = quiz::generate_quiz(&pipeline, &request).await?;
//! println!("{} questions", response.quiz.len());
//! # Ok(())
//! # }
//! ```

pub mod arabic;
pub mod domains;
pub mod error;
pub mod genai;
pub mod pipeline;
pub mod repair;
pub mod sanitize;
pub mod schema;

pub use error::{Error, Result};
pub use genai::{
    with_retry, ClientConfig, GenAiError, GenerationClient, Generator, RetryConfig,
};
pub use pipeline::Pipeline;
pub use repair::{PathSegment, RepairConfig, RepairTarget};
pub use schema::{Field, Schema, Violation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
