//! Shape repair for closed-vocabulary fields
//!
//! The generator's output vocabulary is not perfectly controllable via
//! prompting alone: enumerated fields come back as synonyms,
//! differently-cased terms, or Arabic translations of the canonical
//! value. The repairer rewrites known drift before strict validation
//! using versioned synonym tables; anything the table does not cover
//! falls back to a caller-supplied contextual default. Repair is
//! best-effort and operates on a copy of the payload, never in place.

use std::collections::HashMap;

use serde_json::Value;

use crate::{Error, Result};

/// One segment of a path to an enumerated field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Descend into an object field
    Field(String),
    /// Visit every element of an array
    Each,
}

impl PathSegment {
    /// Shorthand for a field segment
    pub fn field(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

/// One enumerated field to repair
#[derive(Debug, Clone)]
pub struct RepairTarget {
    /// Where the field lives in the payload
    pub path: Vec<PathSegment>,
    /// The closed vocabulary the field must draw from
    pub allowed: Vec<String>,
    /// Synonym-to-canonical mapping for known drift
    pub synonyms: HashMap<String, String>,
    /// Fallback when the emitted value is neither allowed nor mapped,
    /// typically the enclosing request's primary category
    pub default: String,
}

impl RepairTarget {
    pub fn new(
        path: Vec<PathSegment>,
        allowed: &[&str],
        synonyms: HashMap<String, String>,
        default: &str,
    ) -> Self {
        Self {
            path,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            synonyms,
            default: default.to_string(),
        }
    }
}

/// Endpoint-specific repair configuration
#[derive(Debug, Clone, Default)]
pub struct RepairConfig {
    pub targets: Vec<RepairTarget>,
}

impl RepairConfig {
    pub fn new(targets: Vec<RepairTarget>) -> Self {
        Self { targets }
    }

    /// Produce a repaired copy of the payload
    ///
    /// Missing paths are skipped silently; the validator reports them
    /// with proper locations. An error here means the configuration
    /// itself is broken, and the pipeline proceeds unrepaired.
    pub fn apply(&self, value: &Value) -> Result<Value> {
        let mut repaired = value.clone();
        for target in &self.targets {
            if target.path.is_empty() {
                return Err(Error::Configuration {
                    message: "repair target has an empty path".to_string(),
                    source: None,
                });
            }
            rewrite(&mut repaired, &target.path, target);
        }
        Ok(repaired)
    }
}

fn rewrite(value: &mut Value, path: &[PathSegment], target: &RepairTarget) {
    match path.split_first() {
        None => {
            if let Value::String(emitted) = value {
                if !target.allowed.iter().any(|a| a == emitted) {
                    let canonical = target
                        .synonyms
                        .get(emitted.as_str())
                        .cloned()
                        .unwrap_or_else(|| target.default.clone());
                    log::debug!("repaired enum value {:?} -> {:?}", emitted, canonical);
                    *emitted = canonical;
                }
            }
        }
        Some((PathSegment::Field(name), rest)) => {
            if let Some(child) = value.get_mut(name) {
                rewrite(child, rest, target);
            }
        }
        Some((PathSegment::Each, rest)) => {
            if let Some(items) = value.as_array_mut() {
                for item in items {
                    rewrite(item, rest, target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concept_type_config(default: &str) -> RepairConfig {
        let synonyms: HashMap<String, String> = [
            ("grammatical_case", "case"),
            ("verb_tense", "tense"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        RepairConfig::new(vec![RepairTarget::new(
            vec![
                PathSegment::field("relatedConcepts"),
                PathSegment::Each,
                PathSegment::field("type"),
            ],
            &["case", "tense", "mood", "state"],
            synonyms,
            default,
        )])
    }

    #[test]
    fn test_known_synonym_maps_to_canonical() {
        let payload = json!({
            "relatedConcepts": [{ "type": "grammatical_case", "name": "الرفع" }]
        });
        let repaired = concept_type_config("tense").apply(&payload).unwrap();
        assert_eq!(repaired["relatedConcepts"][0]["type"], "case");
    }

    #[test]
    fn test_unknown_value_falls_back_to_default() {
        let payload = json!({
            "relatedConcepts": [{ "type": "حالة نحوية", "name": "الجزم" }]
        });
        let repaired = concept_type_config("mood").apply(&payload).unwrap();
        assert_eq!(repaired["relatedConcepts"][0]["type"], "mood");
    }

    #[test]
    fn test_valid_values_left_untouched() {
        let payload = json!({
            "relatedConcepts": [
                { "type": "case", "name": "a" },
                { "type": "verb_tense", "name": "b" }
            ]
        });
        let repaired = concept_type_config("state").apply(&payload).unwrap();
        assert_eq!(repaired["relatedConcepts"][0]["type"], "case");
        assert_eq!(repaired["relatedConcepts"][1]["type"], "tense");
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let payload = json!({ "name": "lonely" });
        let repaired = concept_type_config("case").apply(&payload).unwrap();
        assert_eq!(repaired, payload);
    }

    #[test]
    fn test_original_payload_not_mutated() {
        let payload = json!({
            "relatedConcepts": [{ "type": "grammatical_case", "name": "x" }]
        });
        let _ = concept_type_config("case").apply(&payload).unwrap();
        assert_eq!(payload["relatedConcepts"][0]["type"], "grammatical_case");
    }

    #[test]
    fn test_empty_path_is_a_config_error() {
        let config = RepairConfig::new(vec![RepairTarget::new(
            vec![],
            &["case"],
            HashMap::new(),
            "case",
        )]);
        assert!(config.apply(&json!({})).is_err());
    }
}
