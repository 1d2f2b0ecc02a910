//! Quiz generation and answer evaluation
//!
//! Quiz generation is a full pipeline invocation; answer evaluation is
//! a local index comparison that never calls the generation service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::genai::Generator;
use crate::pipeline::Pipeline;
use crate::schema::{Field, Schema};
use crate::{Error, Result};

const MIN_QUESTIONS: u32 = 1;
const MAX_QUESTIONS: u32 = 15;

/// Request for a generated quiz
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub topic: String,
    pub difficulty: String,
    pub question_count: u32,
}

/// One multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question_text: String,
    /// Always exactly 4 answers
    pub options: Vec<String>,
    /// 0-based index into `options`
    pub correct_answer_index: u8,
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
struct QuizPayload {
    quiz: Vec<QuizQuestion>,
}

/// Metadata attached to a generated quiz
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMetadata {
    pub generated_at: DateTime<Utc>,
    pub requested_count: u32,
    pub actual_count: u32,
    pub topic: String,
    pub difficulty: String,
}

/// A validated quiz with metadata
#[derive(Debug, Clone, Serialize)]
pub struct QuizResponse {
    pub quiz: Vec<QuizQuestion>,
    pub metadata: QuizMetadata,
}

/// Request for evaluating one answer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: String,
    pub user_answer_index: u8,
    pub correct_answer_index: u8,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Evaluation of one answer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    pub question_id: String,
    pub is_correct: bool,
    /// 100 for a correct answer, 0 otherwise
    pub score: u8,
    pub feedback: String,
    pub user_answer_index: u8,
    pub correct_answer_index: u8,
}

fn question_schema() -> Schema {
    Schema::object(vec![
        Field::required("id", Schema::string()),
        Field::required("questionText", Schema::string()),
        Field::required("options", Schema::array_exactly(Schema::string(), 4)),
        Field::required("correctAnswerIndex", Schema::bounded_integer(0, 3)),
        Field::required("explanation", Schema::string()),
    ])
}

/// Schema for the quiz-generation payload
pub fn quiz_schema() -> Schema {
    Schema::object(vec![Field::required(
        "quiz",
        Schema::array_of(question_schema()),
    )])
}

fn quiz_prompt(request: &QuizRequest) -> String {
    format!(
        "Generate an Arabic grammar quiz with {count} multiple-choice questions on the topic \"{topic}\" at the {difficulty} difficulty level.\n\n\
For each question, provide:\n\
1. A unique identifier (use a simple format like question-1, question-2, etc. for now, I will replace it later).\n\
2. The question text in Arabic (\"questionText\").\n\
3. An array of 4 possible answers in Arabic (\"options\").\n\
4. The index (0-based) of the correct answer within the options array (\"correctAnswerIndex\").\n\
5. A brief explanation in Arabic why the correct answer is right (\"explanation\").\n\n\
Return the result as a JSON object with a single key \"quiz\" which is an array of question objects, matching this structure:\n\
{{\n\
  \"quiz\": [\n\
    {{\n\
      \"id\": \"string\",\n\
      \"questionText\": \"string\",\n\
      \"options\": [\"string\", \"string\", \"string\", \"string\"],\n\
      \"correctAnswerIndex\": number,\n\
      \"explanation\": \"string\"\n\
    }}\n\
  ]\n\
}}\n",
        count = request.question_count,
        topic = request.topic,
        difficulty = request.difficulty,
    )
}

/// Generate a validated quiz
///
/// Question ids coming back from the generator are placeholders; fresh
/// UUIDs are assigned after validation succeeds.
pub async fn generate_quiz<G: Generator>(
    pipeline: &Pipeline<G>,
    request: &QuizRequest,
) -> Result<QuizResponse> {
    if request.topic.trim().is_empty() || request.difficulty.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Missing required fields: topic, difficulty, questionCount".to_string(),
        });
    }
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&request.question_count) {
        return Err(Error::InvalidInput {
            message: format!(
                "Question count must be between {} and {}",
                MIN_QUESTIONS, MAX_QUESTIONS
            ),
        });
    }

    let prompt = quiz_prompt(request);
    let payload: QuizPayload = pipeline
        .generate_structured(&prompt, &quiz_schema(), None)
        .await?;

    let quiz: Vec<QuizQuestion> = payload
        .quiz
        .into_iter()
        .map(|question| QuizQuestion {
            id: Uuid::new_v4().to_string(),
            ..question
        })
        .collect();

    log::info!(
        "generated quiz with {} question(s) on {:?}",
        quiz.len(),
        request.topic
    );

    let metadata = QuizMetadata {
        generated_at: Utc::now(),
        requested_count: request.question_count,
        actual_count: quiz.len() as u32,
        topic: request.topic.clone(),
        difficulty: request.difficulty.clone(),
    };

    Ok(QuizResponse { quiz, metadata })
}

/// Evaluate an answer locally by index comparison
pub fn evaluate_answer(request: &AnswerRequest) -> Result<AnswerEvaluation> {
    if request.user_answer_index > 3 || request.correct_answer_index > 3 {
        return Err(Error::InvalidInput {
            message: "Answer indices must be valid numbers between 0 and 3.".to_string(),
        });
    }

    let is_correct = request.user_answer_index == request.correct_answer_index;
    let feedback = match (&request.explanation, is_correct) {
        (Some(explanation), true) => explanation.clone(),
        (None, true) => "إجابة صحيحة!".to_string(),
        (_, false) => "إجابة خاطئة. الرجاء المحاولة مرة أخرى.".to_string(),
    };

    Ok(AnswerEvaluation {
        question_id: request.question_id.clone(),
        is_correct,
        score: if is_correct { 100 } else { 0 },
        feedback,
        user_answer_index: request.user_answer_index,
        correct_answer_index: request.correct_answer_index,
    })
}
