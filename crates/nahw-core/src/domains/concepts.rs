//! Grammar-concept lookup
//!
//! The concept type vocabulary is the closed set the generator drifts
//! on most, so this module owns the synonym table the shape repairer
//! uses and the contextual-default rule (unknown types collapse to the
//! request's own concept type).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::genai::Generator;
use crate::pipeline::Pipeline;
use crate::repair::{PathSegment, RepairConfig, RepairTarget};
use crate::schema::{Field, Schema};
use crate::{Error, Result};

/// Closed vocabulary of grammar concept types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    PartOfSpeech,
    Case,
    Tense,
    Voice,
    Mood,
    Gender,
    Number,
    State,
    NounType,
    VerbForm,
    SentenceType,
    Derivative,
}

impl ConceptType {
    pub const ALL: [ConceptType; 12] = [
        ConceptType::PartOfSpeech,
        ConceptType::Case,
        ConceptType::Tense,
        ConceptType::Voice,
        ConceptType::Mood,
        ConceptType::Gender,
        ConceptType::Number,
        ConceptType::State,
        ConceptType::NounType,
        ConceptType::VerbForm,
        ConceptType::SentenceType,
        ConceptType::Derivative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptType::PartOfSpeech => "part_of_speech",
            ConceptType::Case => "case",
            ConceptType::Tense => "tense",
            ConceptType::Voice => "voice",
            ConceptType::Mood => "mood",
            ConceptType::Gender => "gender",
            ConceptType::Number => "number",
            ConceptType::State => "state",
            ConceptType::NounType => "noun_type",
            ConceptType::VerbForm => "verb_form",
            ConceptType::SentenceType => "sentence_type",
            ConceptType::Derivative => "derivative",
        }
    }

    /// The allowed concept values for this type
    pub fn values(&self) -> &'static [&'static str] {
        match self {
            ConceptType::Tense => {
                &["past", "present", "future", "perfect", "continuous", "imperative"]
            }
            ConceptType::PartOfSpeech => &[
                "verb", "subject", "predicate", "noun", "adjective", "adverb",
                "preposition", "pronoun", "conjunction",
            ],
            ConceptType::Case => &["nominative", "accusative", "genitive", "jussive"],
            ConceptType::NounType => {
                &["definite", "indefinite", "proper", "common", "collective", "abstract"]
            }
            ConceptType::Number => {
                &["singular", "dual", "plural", "sound plural", "broken plural"]
            }
            ConceptType::VerbForm => &[
                "form I", "form II", "form III", "form IV", "form V",
                "form VI", "form VII", "form VIII", "form IX", "form X",
            ],
            ConceptType::SentenceType => {
                &["nominal", "verbal", "conditional", "interrogative", "negative"]
            }
            ConceptType::Gender => &["masculine", "feminine"],
            ConceptType::Derivative => &[
                "verbal noun", "active participle", "passive participle",
                "comparative", "place noun", "time noun", "tool noun",
            ],
            ConceptType::Voice => &["active", "passive"],
            ConceptType::Mood => &["indicative", "subjunctive", "jussive", "imperative"],
            ConceptType::State => &["declined", "indeclinable"],
        }
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConceptType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidInput {
                message: format!(
                    "Invalid concept type {:?}. Allowed types: {}",
                    s,
                    allowed_types_joined(", ")
                ),
            })
    }
}

/// All allowed concept type names
pub fn concept_types() -> [&'static str; 12] {
    ConceptType::ALL.map(|t| t.as_str())
}

fn allowed_types_joined(separator: &str) -> String {
    concept_types().join(separator)
}

/// Versioned synonym-to-canonical mapping for concept types
///
/// Covers the drift classes observed in production: English synonyms
/// and Arabic translations of the canonical term. New synonym classes
/// are data changes here, not logic changes.
pub fn type_synonyms() -> HashMap<String, String> {
    [
        ("grammatical_case", "case"),
        ("حالة إعرابية", "case"),
        ("علامة إعرابية", "case"),
        ("verb_tense", "tense"),
        ("noun_state", "state"),
        ("verbal_noun", "derivative"),
        ("sentence_structure", "sentence_type"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Repair configuration for payloads carrying a `relatedConcepts` array
///
/// Unknown types default to the enclosing request's own concept type.
pub fn related_concepts_repair(default: ConceptType) -> RepairConfig {
    RepairConfig::new(vec![RepairTarget::new(
        vec![
            PathSegment::field("relatedConcepts"),
            PathSegment::Each,
            PathSegment::field("type"),
        ],
        &concept_types(),
        type_synonyms(),
        default.as_str(),
    )])
}

/// An example sentence illustrating a concept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarExample {
    pub arabic_text: String,
    pub translation: String,
    pub explanation: String,
}

/// A pointer to a related concept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedConcept {
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    pub name: String,
}

/// A related concept with descriptive context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRelatedConcept {
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    pub name: String,
    pub name_arabic: String,
    pub brief_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A fully explained grammar concept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarConcept {
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    pub name: String,
    pub name_arabic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub description: String,
    pub examples: Vec<GrammarExample>,
    pub tips: Vec<String>,
    pub related_concepts: Vec<RelatedConcept>,
}

/// Payload for the related-concepts operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedConcepts {
    pub related_concepts: Vec<ExtendedRelatedConcept>,
}

/// Request for a concept explanation
#[derive(Debug, Clone)]
pub struct ConceptRequest {
    pub concept_type: ConceptType,
    pub concept_name: String,
}

/// Request for related-concept suggestions
#[derive(Debug, Clone)]
pub struct RelatedConceptsRequest {
    pub concept_type: ConceptType,
    pub concept_name: String,
    /// Number of suggestions, clamped to 1..=5
    pub count: u32,
}

fn concept_type_schema() -> Schema {
    Schema::enumeration(&concept_types())
}

fn example_schema() -> Schema {
    Schema::object(vec![
        Field::required("arabicText", Schema::string()),
        Field::required("translation", Schema::string()),
        Field::required("explanation", Schema::string()),
    ])
}

/// Schema for a full concept explanation
pub fn grammar_concept_schema() -> Schema {
    Schema::object(vec![
        Field::required("type", concept_type_schema()),
        Field::required("name", Schema::string()),
        Field::required("nameArabic", Schema::string()),
        Field::optional("color", Schema::string()),
        Field::required("description", Schema::string()),
        Field::required("examples", Schema::array_of(example_schema())),
        Field::required("tips", Schema::array_of(Schema::string())),
        Field::required(
            "relatedConcepts",
            Schema::array_of(Schema::object(vec![
                Field::required("type", concept_type_schema()),
                Field::required("name", Schema::string()),
            ])),
        ),
    ])
}

/// Schema for related-concept suggestions
pub fn related_concepts_schema() -> Schema {
    Schema::object(vec![Field::required(
        "relatedConcepts",
        Schema::array_of(Schema::object(vec![
            Field::required("type", concept_type_schema()),
            Field::required("name", Schema::string()),
            Field::required("nameArabic", Schema::string()),
            Field::required("briefDescription", Schema::string()),
            Field::optional("color", Schema::string()),
        ])),
    )])
}

fn vocabulary_reminder() -> String {
    format!(
        "هام جدًا: لمفتاح \"type\"، استخدم فقط إحدى القيم التالية بالضبط:\n- {}\nلا تستخدم مصطلحات أخرى مثل \"grammatical_case\" أو \"حالة إعرابية\" أو غيرها.",
        concept_types().join("\n- ")
    )
}

fn concept_prompt(request: &ConceptRequest) -> String {
    format!(
        "قدم شرحًا مفصلًا وأمثلة للمفهوم النحوي العربي التالي:\n\n\
نوع المفهوم: {concept_type}\n\
اسم المفهوم: {concept_name}\n\n\
يجب أن تكون جميع الإجابات باللغة العربية فقط. قم بتضمين ما يلي في إجابتك:\n\
1. وصف واضح للمفهوم بعبارات بسيطة باللغة العربية\n\
2. الاسم العربي للمفهوم\n\
3. على الأقل 3 أمثلة توضح استخدام المفهوم، مع:\n\
   - النص العربي (مشكّل بالكامل)\n\
   - شرح بالعربية\n\
   - توضيح كيفية تطبيق المفهوم باللغة العربية\n\
4. نصائح عملية للتعرف على واستخدام هذا المفهوم النحوي باللغة العربية\n\
5. مفاهيم نحوية ذات صلة قد تكون مفيدة للفهم\n\n\
رجاءً أعد الرد بتنسيق JSON مع المفاتيح التالية:\n\
{{\n\
  \"type\": \"نوع المفهوم\",\n\
  \"name\": \"اسم المفهوم المحدد\",\n\
  \"nameArabic\": \"الاسم العربي للمفهوم\",\n\
  \"description\": \"وصف المفهوم بالعربية\",\n\
  \"examples\": [\n\
    {{\n\
      \"arabicText\": \"نص المثال بالعربية\",\n\
      \"translation\": \"الشرح بالعربية\",\n\
      \"explanation\": \"شرح كيفية تطبيق المفهوم بالعربية\"\n\
    }}\n\
  ],\n\
  \"tips\": [\"نصائح...\"],\n\
  \"relatedConcepts\": [\n\
    {{\n\
      \"type\": \"نوع المفهوم ذي الصلة\",\n\
      \"name\": \"اسم المفهوم ذي الصلة\"\n\
    }}\n\
  ]\n\
}}\n\n\
{reminder}",
        concept_type = request.concept_type,
        concept_name = request.concept_name,
        reminder = vocabulary_reminder(),
    )
}

fn related_concepts_prompt(request: &RelatedConceptsRequest, count: u32) -> String {
    format!(
        "اقترح {count} من مفاهيم النحو العربي المرتبطة بالمفهوم التالي:\n\n\
نوع المفهوم: {concept_type}\n\
اسم المفهوم: {concept_name}\n\n\
يجب أن تكون جميع الإجابات باللغة العربية فقط. لكل مفهوم مقترح، قدم:\n\
1. نوع المفهوم النحوي\n\
2. اسم المفهوم\n\
3. الاسم العربي للمفهوم\n\
4. وصف موجز لعلاقته بالمفهوم الأصلي باللغة العربية\n\n\
اختر المفاهيم التي قد تكون مفيدة لشخص يتعلم عن {concept_name}.\n\n\
رجاءً أعد الرد بتنسيق JSON مع المفتاح \"relatedConcepts\" الذي يحتوي على مصفوفة من الكائنات:\n\
{{\n\
  \"relatedConcepts\": [\n\
    {{\n\
      \"type\": \"نوع المفهوم ذي الصلة\",\n\
      \"name\": \"اسم المفهوم ذي الصلة\",\n\
      \"nameArabic\": \"الاسم العربي للمفهوم\",\n\
      \"briefDescription\": \"وصف موجز بالعربية\"\n\
    }}\n\
  ]\n\
}}\n\n\
{reminder}",
        count = count,
        concept_type = request.concept_type,
        concept_name = request.concept_name,
        reminder = vocabulary_reminder(),
    )
}

/// Explain a grammar concept with examples and tips
pub async fn explain_concept<G: Generator>(
    pipeline: &Pipeline<G>,
    request: &ConceptRequest,
) -> Result<GrammarConcept> {
    if request.concept_name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Please provide both conceptType and conceptName".to_string(),
        });
    }

    let prompt = concept_prompt(request);
    pipeline
        .generate_structured(
            &prompt,
            &grammar_concept_schema(),
            Some(&related_concepts_repair(request.concept_type)),
        )
        .await
}

/// Suggest related grammar concepts
pub async fn related_concepts<G: Generator>(
    pipeline: &Pipeline<G>,
    request: &RelatedConceptsRequest,
) -> Result<RelatedConcepts> {
    if request.concept_name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Please provide both conceptType and conceptName".to_string(),
        });
    }

    let count = request.count.clamp(1, 5);
    let prompt = related_concepts_prompt(request, count);
    pipeline
        .generate_structured(
            &prompt,
            &related_concepts_schema(),
            Some(&related_concepts_repair(request.concept_type)),
        )
        .await
}
