//! Pipeline orchestration
//!
//! Composes the retrying invoker, generation client, sanitizer, shape
//! repairer, and schema validator for one endpoint invocation. Failures
//! come back as classified `Error` variants (generation, format,
//! schema) so an HTTP-facing collaborator can choose status codes
//! without the core knowing about HTTP.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::genai::{with_retry, Generator, RetryConfig};
use crate::repair::RepairConfig;
use crate::sanitize::sanitize_and_parse;
use crate::schema::{self, Schema, Violation};
use crate::{Error, Result};

/// Orchestrator for generation requests
///
/// Holds the injected generation client and the retry configuration;
/// both are read-only and safely shared across concurrent requests.
pub struct Pipeline<G> {
    generator: G,
    retry: RetryConfig,
}

impl<G: Generator> Pipeline<G> {
    /// Create a pipeline with the default retry configuration
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry configuration
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Access the underlying generation client
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generate free-form text with retry
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        with_retry(|| self.generator.generate(prompt), &self.retry)
            .await
            .map_err(Error::from)
    }

    /// Generate, sanitize, repair, validate, and promote to a typed
    /// payload
    ///
    /// The repair step is best-effort: if it fails, validation proceeds
    /// on the unrepaired payload rather than aborting the request.
    pub async fn generate_structured<T>(
        &self,
        prompt: &str,
        schema: &Schema,
        repair: Option<&RepairConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.generate_text(prompt).await?;
        let parsed = sanitize_and_parse(&raw)?;
        let candidate = apply_repair(parsed, repair);

        let violations = schema::validate(schema, &candidate);
        if !violations.is_empty() {
            log::error!(
                "schema validation failed with {} violation(s); first: {}",
                violations.len(),
                violations[0]
            );
            log::debug!("rejected payload: {}", candidate);
            return Err(Error::SchemaViolations { violations });
        }

        serde_json::from_value(candidate).map_err(|e| Error::SchemaViolations {
            violations: vec![Violation {
                path: "$".to_string(),
                message: format!("validated payload did not deserialize: {}", e),
                expected: None,
                actual: None,
            }],
        })
    }
}

fn apply_repair(parsed: Value, repair: Option<&RepairConfig>) -> Value {
    match repair {
        Some(config) => match config.apply(&parsed) {
            Ok(repaired) => repaired,
            Err(error) => {
                log::error!("repair step failed, validating unrepaired payload: {}", error);
                parsed
            }
        },
        None => parsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::{PathSegment, RepairTarget};
    use crate::schema::Field;
    use std::collections::HashMap;

    #[test]
    fn test_broken_repair_config_degrades_gracefully() {
        let parsed = serde_json::json!({ "type": "grammatical_case" });
        let config = RepairConfig::new(vec![RepairTarget::new(
            vec![],
            &["case"],
            HashMap::new(),
            "case",
        )]);
        // Empty path is a configuration error; payload passes through
        assert_eq!(apply_repair(parsed.clone(), Some(&config)), parsed);
    }

    #[test]
    fn test_repair_applied_before_validation() {
        let parsed = serde_json::json!({ "type": "verb_tense" });
        let synonyms: HashMap<String, String> =
            [("verb_tense".to_string(), "tense".to_string())].into_iter().collect();
        let config = RepairConfig::new(vec![RepairTarget::new(
            vec![PathSegment::field("type")],
            &["case", "tense"],
            synonyms,
            "case",
        )]);
        let repaired = apply_repair(parsed, Some(&config));
        let schema = Schema::object(vec![Field::required(
            "type",
            Schema::enumeration(&["case", "tense"]),
        )]);
        assert!(schema::validate(&schema, &repaired).is_empty());
    }
}
