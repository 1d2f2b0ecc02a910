//! Grammar exercise generation and answer checking

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arabic::is_valid_arabic;
use crate::genai::Generator;
use crate::pipeline::Pipeline;
use crate::repair::{PathSegment, RepairConfig, RepairTarget};
use crate::schema::{Field, Schema};
use crate::{Error, Result};

const MIN_COUNT: u32 = 1;
const MAX_COUNT: u32 = 10;

/// Closed vocabulary of exercise types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
    Parsing,
    FillInBlanks,
    ErrorCorrection,
    MultipleChoice,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 4] = [
        ExerciseType::Parsing,
        ExerciseType::FillInBlanks,
        ExerciseType::ErrorCorrection,
        ExerciseType::MultipleChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Parsing => "parsing",
            ExerciseType::FillInBlanks => "fill-in-blanks",
            ExerciseType::ErrorCorrection => "error-correction",
            ExerciseType::MultipleChoice => "multiple-choice",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for generated exercises
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    pub difficulty: String,
    pub exercise_type: ExerciseType,
    pub count: u32,
}

/// One generated exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub text: String,
    pub question: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub hint: String,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExercisesPayload {
    exercises: Vec<Exercise>,
}

/// A validated batch of exercises
#[derive(Debug, Clone, Serialize)]
pub struct ExercisesResponse {
    pub exercises: Vec<Exercise>,
}

/// Request for AI feedback on a submitted answer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub exercise_id: String,
    pub exercise_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub exercise_type: ExerciseType,
}

/// AI feedback on a submitted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    /// Percentage score, 0-100
    pub score: u8,
    pub feedback: String,
    pub correct_answer: String,
    pub explanation: String,
}

fn exercise_type_values() -> [&'static str; 4] {
    ExerciseType::ALL.map(|t| t.as_str())
}

fn exercise_schema() -> Schema {
    Schema::object(vec![
        Field::required("id", Schema::string()),
        Field::required("text", Schema::string()),
        Field::required("question", Schema::string()),
        Field::required("type", Schema::enumeration(&exercise_type_values())),
        Field::optional("options", Schema::array_of(Schema::string())).nullable(),
        Field::required("hint", Schema::string()),
        Field::required("correctAnswer", Schema::string()),
        Field::required("explanation", Schema::string()),
    ])
}

/// Schema for the exercise-generation payload
pub fn exercises_schema() -> Schema {
    Schema::object(vec![Field::required(
        "exercises",
        Schema::array_of(exercise_schema()),
    )])
}

/// Schema for the answer-checking payload
pub fn answer_feedback_schema() -> Schema {
    Schema::object(vec![
        Field::required("isCorrect", Schema::Bool),
        Field::required("score", Schema::bounded_integer(0, 100)),
        Field::required("feedback", Schema::string()),
        Field::required("correctAnswer", Schema::string()),
        Field::required("explanation", Schema::string()),
    ])
}

/// Repair configuration pinning each exercise's type to the request
///
/// The generator occasionally restates the type in its own words; any
/// out-of-vocabulary value collapses to the requested exercise type.
pub fn exercise_type_repair(requested: ExerciseType) -> RepairConfig {
    RepairConfig::new(vec![RepairTarget::new(
        vec![
            PathSegment::field("exercises"),
            PathSegment::Each,
            PathSegment::field("type"),
        ],
        &exercise_type_values(),
        HashMap::new(),
        requested.as_str(),
    )])
}

fn exercises_prompt(request: &ExerciseRequest) -> String {
    format!(
        "Generate {count} Arabic grammar exercises at the {difficulty} level of the type {exercise_type}.\n\n\
Create authentic exercises that focus on real Arabic grammatical concepts. The exercises should be educational and help users practice Arabic grammar analysis.\n\n\
For each exercise, include:\n\
1. A unique identifier (use a simple format like exercise-1, exercise-2, etc. for now, I will replace it later).\n\
2. The Arabic text for the exercise (\"text\").\n\
3. The question or instructions for the exercise (\"question\").\n\
4. The type of exercise (\"type\": {exercise_type}).\n\
5. Options for multiple-choice questions (\"options\"), if applicable.\n\
6. A hint for the exercise (\"hint\").\n\
7. The correct answer or solution (\"correctAnswer\").\n\
8. Detailed explanation of the correct answer (\"explanation\").\n\n\
Return the result as a JSON object with a single key \"exercises\" which is an array of exercise objects, matching this structure:\n\
{{\n\
  \"exercises\": [\n\
    {{\n\
      \"id\": \"string\",\n\
      \"text\": \"string\",\n\
      \"question\": \"string\",\n\
      \"type\": \"{exercise_type}\",\n\
      \"options\": [\"string\"] | null,\n\
      \"hint\": \"string\",\n\
      \"correctAnswer\": \"string\",\n\
      \"explanation\": \"string\"\n\
    }}\n\
  ]\n\
}}\n",
        count = request.count,
        difficulty = request.difficulty,
        exercise_type = request.exercise_type,
    )
}

fn check_answer_prompt(request: &CheckAnswerRequest) -> String {
    format!(
        "Evaluate the user's answer for the following Arabic grammar exercise.\n\n\
Exercise Details:\n\
- Type: {exercise_type}\n\
- Text: {text}\n\
- Correct Answer: {correct}\n\
- User's Answer: {user}\n\n\
Provide feedback in JSON format with the following keys:\n\
- \"isCorrect\": boolean (true if the user's answer is essentially correct, false otherwise).\n\
- \"score\": number (percentage score from 0 to 100, reflecting correctness).\n\
- \"feedback\": string (Detailed feedback in Arabic explaining why the answer is correct or incorrect, pointing out specific errors if any).\n\
- \"correctAnswer\": string (Reiterate the correct answer).\n\
- \"explanation\": string (Explanation in Arabic of the relevant grammar rules applied in this exercise).\n\n\
Example JSON Output:\n\
{{\n\
  \"isCorrect\": true,\n\
  \"score\": 100,\n\
  \"feedback\": \"إجابتك صحيحة! لقد قمت بتحديد الإعراب بشكل دقيق.\",\n\
  \"correctAnswer\": \"فاعل مرفوع وعلامة رفعه الضمة\",\n\
  \"explanation\": \"كلمة 'المعلم' في الجملة 'جاء المعلم' تأتي بعد فعل لازم وتدل على من قام بالفعل، لذا تُعرب فاعلاً مرفوعاً.\"\n\
}}\n\n\
Evaluate the user's answer: {user}",
        exercise_type = request.exercise_type,
        text = request.exercise_text,
        correct = request.correct_answer,
        user = request.user_answer,
    )
}

/// Generate a validated batch of exercises
pub async fn generate_exercises<G: Generator>(
    pipeline: &Pipeline<G>,
    request: &ExerciseRequest,
) -> Result<ExercisesResponse> {
    if request.difficulty.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Missing required fields: difficulty, exerciseType, count".to_string(),
        });
    }
    if !(MIN_COUNT..=MAX_COUNT).contains(&request.count) {
        return Err(Error::InvalidInput {
            message: format!("Count must be between {} and {}", MIN_COUNT, MAX_COUNT),
        });
    }

    let prompt = exercises_prompt(request);
    let payload: ExercisesPayload = pipeline
        .generate_structured(
            &prompt,
            &exercises_schema(),
            Some(&exercise_type_repair(request.exercise_type)),
        )
        .await?;

    let exercises: Vec<Exercise> = payload
        .exercises
        .into_iter()
        .map(|exercise| Exercise {
            id: Uuid::new_v4().to_string(),
            ..exercise
        })
        .collect();

    log::info!(
        "generated {} {} exercise(s) at {} level",
        exercises.len(),
        request.exercise_type,
        request.difficulty
    );

    Ok(ExercisesResponse { exercises })
}

/// Check a submitted answer through the generation service
pub async fn check_answer<G: Generator>(
    pipeline: &Pipeline<G>,
    request: &CheckAnswerRequest,
) -> Result<AnswerFeedback> {
    if !request.user_answer.is_empty() && !is_valid_arabic(&request.user_answer) {
        return Err(Error::InvalidInput {
            message: "Please enter your answer in Arabic.".to_string(),
        });
    }

    let prompt = check_answer_prompt(request);
    pipeline
        .generate_structured(&prompt, &answer_feedback_schema(), None)
        .await
}
