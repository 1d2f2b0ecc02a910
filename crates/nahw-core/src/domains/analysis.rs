//! Morphological and syntactic analysis of Arabic text
//!
//! Three operations share this module: structured token/tree analysis,
//! an Arabic-prose explanation of an existing analysis, and direct
//! sentence parsing (iʿrab) whose free-text output is validated against
//! a fixed section format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arabic::is_valid_arabic;
use crate::genai::Generator;
use crate::pipeline::Pipeline;
use crate::schema::{self, Field, Schema};
use crate::{Error, Result};

/// Section headers the iʿrab explanation format requires
const IRAB_MARKERS: [&str; 2] = ["الجملة الأصلية:", "الإعراب:"];

/// One analyzed token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub diacritized: String,
    pub root: String,
    pub pattern: String,
    pub pos: String,
    /// Morphological features, keyed by part of speech (gender, tense,
    /// case, ...). Deliberately free-form: the generator's feature
    /// vocabulary varies per token.
    #[serde(default)]
    pub features: serde_json::Map<String, Value>,
}

/// One node of the syntactic analysis tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_indices: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SyntaxNode>>,
}

/// Full analysis payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tokens: Vec<Token>,
    /// The generator sometimes fails to produce a tree; null and
    /// absent are both accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_tree: Option<SyntaxNode>,
}

/// Arabic-prose explanation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarExplanation {
    pub explanation: String,
}

fn token_schema() -> Schema {
    Schema::object(vec![
        Field::required("surface", Schema::string()),
        Field::required("diacritized", Schema::string()),
        Field::required("root", Schema::string()),
        Field::required("pattern", Schema::string()),
        Field::required("pos", Schema::string()),
        Field::required("features", Schema::Map),
    ])
}

/// Recursive schema for the syntactic analysis tree
pub fn syntax_tree_schema() -> Schema {
    Schema::recursive(Schema::object(vec![
        Field::required("type", Schema::string()),
        Field::required("role", Schema::string()),
        Field::optional("tokenIndices", Schema::array_of(Schema::integer())),
        Field::optional("children", Schema::array_of(Schema::SelfRef)),
    ]))
}

/// Schema for the structured analysis payload
pub fn analysis_schema() -> Schema {
    Schema::object(vec![
        Field::required("tokens", Schema::array_of(token_schema())),
        Field::optional("syntaxTree", syntax_tree_schema()).nullable(),
    ])
}

/// Schema for prose explanations
pub fn explanation_schema() -> Schema {
    Schema::object(vec![Field::required("explanation", Schema::string())])
}

/// Schema for the fixed iʿrab output format
pub fn irab_schema() -> Schema {
    Schema::object(vec![Field::required(
        "explanation",
        Schema::string_containing(&IRAB_MARKERS),
    )])
}

fn analysis_prompt(arabic_text: &str) -> String {
    format!(
        "Analyze the following Arabic text and provide a detailed morphological and syntactic analysis in JSON format.\n\n\
Ensure that the output JSON has two top-level keys: \"tokens\" and \"syntaxTree\".\n\n\
The \"tokens\" array should contain an object for each token in the input text, with the following keys:\n\
- \"surface\": The surface form of the token.\n\
- \"diacritized\": The fully diacritized form of the token.\n\
- \"root\": The root of the token.\n\
- \"pattern\": The pattern of the token.\n\
- \"pos\": The part of speech of the token (noun, verb, particle, etc.).\n\
- \"features\": Morphological features that depend on the part of speech:\n\
  - For nouns: gender, number, case, state\n\
  - For verbs: tense, person, voice, mood\n\
  - For particles: type\n\
  - For other: note, custom\n\n\
The \"syntaxTree\" should be a tree structure representing the syntactic analysis, with these properties:\n\
- \"type\": Type of syntactic node (sentence, clause, phrase)\n\
- \"role\": Grammatical role (Subject, Predicate, Object, etc.)\n\
- \"tokenIndices\": Array of indices referring to tokens this node covers\n\
- \"children\": Array of child nodes\n\n\
Arabic Text: {arabic_text}"
    )
}

fn explain_prompt(analysis_json: &str, arabic_text: &str) -> String {
    format!(
        "You are an expert in Arabic grammar and linguistics. Given the following morphological and syntactic analysis of an Arabic sentence, explain the analysis in Arabic, following the example format provided.\n\n\
Example Output Format:\n\
```\n\
الجملة: أنا أريد أن أشرب الماء\n\
الإعراب: ...\n\
```\n\n\
Analysis Result (JSON): {analysis_json}\n\
Original Arabic Text: {arabic_text}\n\n\
Explanation (in Arabic):"
    )
}

fn irab_prompt(arabic_text: &str) -> String {
    format!(
        "أعرب الجملة التالية بدقة وفق القواعد النحوية والصرفية العربية، مع الالتزام بالتنسيق التالي:\n\n\
المطلوب:\n\
1. إعراب كل كلمة بشكل منفصل\n\
2. تحديد نوع كل كلمة (اسم، فعل، حرف)\n\
3. ذكر العلامات الإعرابية مع التفسير\n\
4. تحليل التركيب النحوي للجملة\n\
5. ملاحظات إضافية إن لزم\n\n\
التنسيق المطلوب:\n\
الجملة الأصلية: [هنا الجملة]\n\
الإعراب:\n\
[الكلمة]: \n\
- النوع: \n\
- الإعراب: \n\
- التوضيح: \n\n\
التركيب النحوي:\n\
[شرح التركيب العام]\n\n\
مثال:\n\
إعراب: هيا بنا يا رجال\n\
الجملة الأصلية: هيا بنا يا رجال\n\
الإعراب:\n\
هيا: \n\
- النوع: فعل أمر \n\
- الإعراب: فعل أمر مبني على السكون، الفاعل مستتر\n\
- التوضيح: للتحريض على الفعل\n\n\
التركيب النحوي: جملة فعلية تامة تليها جملة نداء\n\n\
الجملة المراد إعرابها: {arabic_text}\n"
    )
}

/// Produce a structured morphological and syntactic analysis
pub async fn analyze_text<G: Generator>(
    pipeline: &Pipeline<G>,
    arabic_text: &str,
) -> Result<AnalysisResult> {
    if !is_valid_arabic(arabic_text) {
        return Err(Error::InvalidInput {
            message: "Please provide valid Arabic text.".to_string(),
        });
    }

    let prompt = analysis_prompt(arabic_text);
    pipeline
        .generate_structured(&prompt, &analysis_schema(), None)
        .await
}

/// Explain an existing analysis in Arabic prose
pub async fn explain_analysis<G: Generator>(
    pipeline: &Pipeline<G>,
    analysis: &AnalysisResult,
    arabic_text: &str,
) -> Result<GrammarExplanation> {
    if arabic_text.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Please provide both analysisResult and arabicText.".to_string(),
        });
    }

    let analysis_json = serde_json::to_string(analysis)?;
    let prompt = explain_prompt(&analysis_json, arabic_text);
    let explanation = pipeline.generate_text(&prompt).await?;

    let payload = serde_json::json!({ "explanation": explanation });
    schema::check(&explanation_schema(), &payload)?;

    Ok(GrammarExplanation { explanation })
}

/// Parse a sentence (iʿrab) and validate the fixed output format
pub async fn parse_sentence<G: Generator>(
    pipeline: &Pipeline<G>,
    arabic_text: &str,
) -> Result<GrammarExplanation> {
    if !is_valid_arabic(arabic_text) {
        return Err(Error::InvalidInput {
            message: "نص عربي غير صالح".to_string(),
        });
    }

    let prompt = irab_prompt(arabic_text);
    let explanation = pipeline.generate_text(&prompt).await?;

    let payload = serde_json::json!({ "explanation": explanation });
    schema::check(&irab_schema(), &payload)?;

    Ok(GrammarExplanation { explanation })
}
