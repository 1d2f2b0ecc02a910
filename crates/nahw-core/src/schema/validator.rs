//! Schema validation engine
//!
//! Recursively verifies a candidate value against a `Schema` and
//! collects every violation found with a path locating it, so a single
//! failed validation communicates all problems at once. Bounded
//! numeric fields are range-checked, not merely type-checked, and
//! recursive tree shapes validate to unbounded logical depth; the depth
//! counter exists only as cycle protection.

use serde_json::Value;

use super::descriptor::Schema;
use crate::{Error, Result};

/// Hard ceiling on recursion, far above any legitimate syntax tree.
/// Exceeding it produces a violation rather than a stack overflow.
const MAX_DEPTH: usize = 128;

/// One schema violation with its location
#[derive(Debug, Clone)]
pub struct Violation {
    /// Path to the offending value, rooted at `$`
    pub path: String,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a candidate value, returning every violation found
pub fn validate(schema: &Schema, value: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut binders = Vec::new();
    walk(schema, value, "$", &mut binders, 0, &mut violations);
    violations
}

/// Validate and convert any violations into a crate error
pub fn check(schema: &Schema, value: &Value) -> Result<()> {
    let violations = validate(schema, value);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaViolations { violations })
    }
}

fn walk<'a>(
    schema: &'a Schema,
    value: &Value,
    path: &str,
    binders: &mut Vec<&'a Schema>,
    depth: usize,
    violations: &mut Vec<Violation>,
) {
    if depth > MAX_DEPTH {
        violations.push(Violation {
            path: path.to_string(),
            message: format!("recursion depth exceeds {} levels, structure assumed cyclic", MAX_DEPTH),
            expected: None,
            actual: None,
        });
        return;
    }

    match schema {
        Schema::Any => {}

        Schema::Bool => {
            if !value.is_boolean() {
                violations.push(type_mismatch(path, "boolean", value));
            }
        }

        Schema::String { must_contain } => match value.as_str() {
            Some(text) => {
                for marker in must_contain {
                    if !text.contains(marker.as_str()) {
                        violations.push(Violation {
                            path: path.to_string(),
                            message: format!("string does not contain required marker {:?}", marker),
                            expected: Some(format!("text containing {:?}", marker)),
                            actual: None,
                        });
                    }
                }
            }
            None => violations.push(type_mismatch(path, "string", value)),
        },

        Schema::Integer { min, max } => match value.as_i64() {
            Some(n) => {
                if let Some(min) = min {
                    if n < *min {
                        violations.push(range_violation(path, n, *min, *max));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        violations.push(range_violation(
                            path,
                            n,
                            min.unwrap_or(i64::MIN),
                            Some(*max),
                        ));
                    }
                }
            }
            None => violations.push(type_mismatch(path, "integer", value)),
        },

        Schema::Number { min, max } => match value.as_f64() {
            Some(n) => {
                if min.map_or(false, |min| n < min) || max.map_or(false, |max| n > max) {
                    violations.push(Violation {
                        path: path.to_string(),
                        message: format!("number {} is out of range", n),
                        expected: Some(format!("value in [{:?}, {:?}]", min, max)),
                        actual: Some(n.to_string()),
                    });
                }
            }
            None => violations.push(type_mismatch(path, "number", value)),
        },

        Schema::Enum { values } => match value.as_str() {
            Some(text) => {
                if !values.iter().any(|v| v == text) {
                    violations.push(Violation {
                        path: path.to_string(),
                        message: format!("{:?} is not in the allowed value set", text),
                        expected: Some(format!("one of {:?}", values)),
                        actual: Some(text.to_string()),
                    });
                }
            }
            None => violations.push(type_mismatch(path, "string", value)),
        },

        Schema::Array { items, min_len, max_len } => match value.as_array() {
            Some(elements) => {
                let len = elements.len();
                let out_of_bounds = min_len.map_or(false, |min| len < min)
                    || max_len.map_or(false, |max| len > max);
                if out_of_bounds {
                    violations.push(Violation {
                        path: path.to_string(),
                        message: format!("array has {} element(s)", len),
                        expected: Some(length_expectation(*min_len, *max_len)),
                        actual: Some(format!("{} element(s)", len)),
                    });
                }
                for (i, element) in elements.iter().enumerate() {
                    let child_path = format!("{}[{}]", path, i);
                    walk(items, element, &child_path, binders, depth + 1, violations);
                }
            }
            None => violations.push(type_mismatch(path, "array", value)),
        },

        Schema::Object { fields } => match value.as_object() {
            Some(map) => {
                for field in fields {
                    let child_path = format!("{}.{}", path, field.name);
                    match map.get(&field.name) {
                        None => {
                            if field.required {
                                violations.push(Violation {
                                    path: child_path,
                                    message: format!("required field {:?} is missing", field.name),
                                    expected: Some(describe(&field.schema)),
                                    actual: Some("missing".to_string()),
                                });
                            }
                        }
                        Some(Value::Null) if field.nullable => {}
                        Some(child) => {
                            walk(&field.schema, child, &child_path, binders, depth + 1, violations);
                        }
                    }
                }
            }
            None => violations.push(type_mismatch(path, "object", value)),
        },

        Schema::Map => {
            if !value.is_object() {
                violations.push(type_mismatch(path, "object", value));
            }
        }

        Schema::Recursive(inner) => {
            binders.push(schema);
            walk(inner, value, path, binders, depth + 1, violations);
            binders.pop();
        }

        Schema::SelfRef => {
            let binder: Option<&'a Schema> = binders.last().copied();
            match binder {
                Some(Schema::Recursive(inner)) => {
                    walk(inner, value, path, binders, depth + 1, violations);
                }
                _ => violations.push(Violation {
                    path: path.to_string(),
                    message: "self-reference outside a recursive schema".to_string(),
                    expected: None,
                    actual: None,
                }),
            }
        }
    }
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> Violation {
    Violation {
        path: path.to_string(),
        message: format!("expected {}, found {}", expected, type_name(value)),
        expected: Some(expected.to_string()),
        actual: Some(type_name(value).to_string()),
    }
}

fn range_violation(path: &str, actual: i64, min: i64, max: Option<i64>) -> Violation {
    Violation {
        path: path.to_string(),
        message: format!("integer {} is out of range", actual),
        expected: Some(match max {
            Some(max) => format!("value in [{}, {}]", min, max),
            None => format!("value >= {}", min),
        }),
        actual: Some(actual.to_string()),
    }
}

fn length_expectation(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format!("exactly {} element(s)", min),
        (Some(min), Some(max)) => format!("between {} and {} element(s)", min, max),
        (Some(min), None) => format!("at least {} element(s)", min),
        (None, Some(max)) => format!("at most {} element(s)", max),
        (None, None) => "any length".to_string(),
    }
}

fn describe(schema: &Schema) -> String {
    match schema {
        Schema::Any => "any value".to_string(),
        Schema::Bool => "boolean".to_string(),
        Schema::String { .. } => "string".to_string(),
        Schema::Integer { .. } => "integer".to_string(),
        Schema::Number { .. } => "number".to_string(),
        Schema::Enum { values } => format!("one of {:?}", values),
        Schema::Array { .. } => "array".to_string(),
        Schema::Object { .. } | Schema::Map => "object".to_string(),
        Schema::Recursive(inner) => describe(inner),
        Schema::SelfRef => "recursive structure".to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
