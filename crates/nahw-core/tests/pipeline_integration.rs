//! End-to-end pipeline tests with a scripted generation client
//!
//! Drives the full retry → sanitize → repair → validate chain through
//! the public API, with a generator double that replays a fixed script
//! of provider responses.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use nahw_core::domains::quiz::{self, QuizRequest};
use nahw_core::repair::{PathSegment, RepairConfig, RepairTarget};
use nahw_core::schema::{Field, Schema};
use nahw_core::{Error, GenAiError, Generator, Pipeline, RetryConfig};
use serde::Deserialize;

/// Replays a scripted sequence of provider responses and counts calls
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenAiError>>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String, GenAiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, _prompt: &str) -> impl Future<Output = Result<String, GenAiError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenAiError::malformed("response script exhausted")));
        async move { next }
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig::new(3)
        .with_initial_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(4))
}

fn overloaded() -> GenAiError {
    GenAiError::from_response(
        503,
        r#"{"error": {"code": 503, "message": "The model is overloaded. Please try again later.", "status": "UNAVAILABLE"}}"#,
    )
}

fn quiz_json() -> String {
    r#"```json
{
  "quiz": [
    {
      "id": "question-1",
      "questionText": "ما إعراب كلمة المعلم في جملة: جاء المعلم؟",
      "options": ["فاعل مرفوع", "مفعول به منصوب", "مبتدأ مرفوع", "خبر مرفوع"],
      "correctAnswerIndex": 0,
      "explanation": "المعلم فاعل مرفوع وعلامة رفعه الضمة الظاهرة."
    },
    {
      "id": "question-2",
      "questionText": "ما علامة نصب المفعول به؟",
      "options": ["الضمة", "الفتحة", "الكسرة", "السكون"],
      "correctAnswerIndex": 1,
      "explanation": "المفعول به منصوب وعلامة نصبه الفتحة."
    }
  ]
}
```"#
        .to_string()
}

fn quiz_request() -> QuizRequest {
    QuizRequest {
        topic: "الإعراب".to_string(),
        difficulty: "beginner".to_string(),
        question_count: 2,
    }
}

#[tokio::test]
async fn transient_failures_then_valid_quiz() {
    let generator = ScriptedGenerator::new(vec![
        Err(overloaded()),
        Err(overloaded()),
        Ok(quiz_json()),
    ]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let response = quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap();

    assert_eq!(response.quiz.len(), 2);
    assert_eq!(response.metadata.actual_count, 2);
    // Placeholder ids from the model are replaced with fresh UUIDs
    assert_ne!(response.quiz[0].id, "question-1");
    assert_ne!(response.quiz[0].id, response.quiz[1].id);
}

#[tokio::test]
async fn retry_invokes_generator_once_per_attempt() {
    let generator = ScriptedGenerator::new(vec![
        Err(overloaded()),
        Err(overloaded()),
        Ok(quiz_json()),
    ]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap();
    assert_eq!(pipeline.generator().calls(), 3);
}

#[tokio::test]
async fn unparseable_output_is_not_retried() {
    let generator = ScriptedGenerator::new(vec![Ok(
        "Sure! Here is your quiz: question one is about إعراب.".to_string(),
    )]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let error = quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap_err();
    match error {
        Error::InvalidFormat { sanitized_text, .. } => {
            assert!(sanitized_text.contains("إعراب"));
        }
        other => panic!("expected InvalidFormat, got: {other}"),
    }
    // A format error comes from a successful provider call; the retry
    // budget does not apply
    assert_eq!(pipeline.generator().calls(), 1);
}

#[tokio::test]
async fn schema_violations_surface_without_retry() {
    let generator = ScriptedGenerator::new(vec![Ok(r#"{
        "quiz": [{
            "id": "question-1",
            "questionText": "سؤال",
            "options": ["أ", "ب", "ج"],
            "correctAnswerIndex": 7,
            "explanation": "شرح"
        }]
    }"#
    .to_string())]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let error = quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap_err();
    let violations = error.violations().expect("schema violations");
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].path, "$.quiz[0].options");
    assert_eq!(violations[1].path, "$.quiz[0].correctAnswerIndex");
    assert_eq!(pipeline.generator().calls(), 1);
}

#[tokio::test]
async fn non_retryable_provider_error_fails_fast() {
    let generator = ScriptedGenerator::new(vec![Err(GenAiError::from_response(
        400,
        r#"{"error": {"code": 400, "message": "API key not valid"}}"#,
    ))]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let error = quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap_err();
    match error {
        Error::Generation { status_code, message, .. } => {
            assert_eq!(status_code, Some(400));
            assert!(message.contains("API key"));
        }
        other => panic!("expected Generation, got: {other}"),
    }
    assert_eq!(pipeline.generator().calls(), 1);
}

#[tokio::test]
async fn exhausted_retries_reraise_the_provider_error() {
    let generator = ScriptedGenerator::new(vec![
        Err(overloaded()),
        Err(overloaded()),
        Err(overloaded()),
        Err(overloaded()),
    ]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let error = quiz::generate_quiz(&pipeline, &quiz_request()).await.unwrap_err();
    match error {
        Error::Generation { status_code, .. } => assert_eq!(status_code, Some(503)),
        other => panic!("expected Generation, got: {other}"),
    }
    // max_retries = 3, so 4 calls total
    assert_eq!(pipeline.generator().calls(), 4);
}

#[derive(Debug, Deserialize)]
struct TypedLabel {
    #[serde(rename = "type")]
    label: String,
}

#[tokio::test]
async fn repair_normalizes_enum_values_before_validation() {
    let generator =
        ScriptedGenerator::new(vec![Ok(r#"{"type": "grammatical_case"}"#.to_string())]);
    let pipeline = Pipeline::new(generator).with_retry_config(fast_retry());

    let synonyms: HashMap<String, String> =
        [("grammatical_case".to_string(), "case".to_string())].into_iter().collect();
    let repair = RepairConfig::new(vec![RepairTarget::new(
        vec![PathSegment::field("type")],
        &["case", "tense"],
        synonyms,
        "case",
    )]);
    let schema = Schema::object(vec![Field::required(
        "type",
        Schema::enumeration(&["case", "tense"]),
    )]);

    let payload: TypedLabel = pipeline
        .generate_structured("prompt", &schema, Some(&repair))
        .await
        .unwrap();
    assert_eq!(payload.label, "case");
}
