//! Recursive value validation.
//!
//! # Rules
//!
//! | Kind | Checks |
//! |------|--------|
//! | `string` | JSON string; optional `pattern` (regex search) |
//! | `number` | JSON number; optional inclusive `min`/`max` |
//! | `boolean` | JSON bool |
//! | `array` | JSON array; every element against `items`, first failure wins |
//! | `object` | JSON object; only properties present in both value and schema |
//!
//! Object validation is permissive: undeclared properties are dropped and
//! absent declared properties are silently omitted. `required` is only
//! enforced for top-level parameters, by [`validate_params`], before any
//! element-level validation runs.

use super::{SchemaError, SchemaKind, SchemaMap, TypeSchema};
use regex::Regex;
use serde_json::{Map, Value};

/// Validates `value` against `schema`, returning the validated value.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found, depth-first.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::schema::{validate, TypeSchema};
/// use serde_json::json;
///
/// let schema = TypeSchema::number().range(0.0, 1.0);
/// assert_eq!(validate(&json!(0.5), &schema).unwrap(), json!(0.5));
/// assert!(validate(&json!(1.5), &schema).is_err());
/// ```
pub fn validate(value: &Value, schema: &TypeSchema) -> Result<Value, SchemaError> {
    validate_at(value, schema, "$")
}

/// Validates a caller-supplied parameter mapping against an input schema.
///
/// Missing required parameters are reported first. A `null` counts as
/// absent. The result only carries declared parameters.
///
/// # Errors
///
/// [`SchemaError::MissingParameter`] for the first missing required name
/// (in schema key order), otherwise the first element-level failure.
pub fn validate_params(
    params: &Map<String, Value>,
    schema: &SchemaMap,
) -> Result<Map<String, Value>, SchemaError> {
    for (name, param_schema) in schema {
        if param_schema.required && is_absent(params.get(name)) {
            return Err(SchemaError::MissingParameter { name: name.clone() });
        }
    }

    let mut validated = Map::new();
    for (name, param_schema) in schema {
        let Some(value) = params.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        validated.insert(name.clone(), validate_at(value, param_schema, name)?);
    }
    Ok(validated)
}

fn is_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

fn validate_at(value: &Value, schema: &TypeSchema, path: &str) -> Result<Value, SchemaError> {
    match schema.kind {
        SchemaKind::String => {
            let Some(text) = value.as_str() else {
                return Err(mismatch(path, schema.kind, value));
            };
            if let Some(pattern) = &schema.pattern {
                let re = Regex::new(pattern).map_err(|_| SchemaError::InvalidPattern {
                    path: path.to_string(),
                    pattern: pattern.clone(),
                })?;
                if !re.is_match(text) {
                    return Err(SchemaError::Pattern {
                        path: path.to_string(),
                        pattern: pattern.clone(),
                    });
                }
            }
            Ok(value.clone())
        }
        SchemaKind::Number => {
            let Some(number) = value.as_f64() else {
                return Err(mismatch(path, schema.kind, value));
            };
            let below = schema.min.is_some_and(|min| number < min);
            let above = schema.max.is_some_and(|max| number > max);
            if below || above {
                return Err(SchemaError::Range {
                    path: path.to_string(),
                    value: number,
                    min: schema.min,
                    max: schema.max,
                });
            }
            Ok(value.clone())
        }
        SchemaKind::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(mismatch(path, schema.kind, value))
            }
        }
        SchemaKind::Array => {
            let Some(elements) = value.as_array() else {
                return Err(mismatch(path, schema.kind, value));
            };
            let Some(items) = &schema.items else {
                return Ok(value.clone());
            };
            let mut out = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                let element_path = format!("{path}[{index}]");
                let checked = validate_at(element, items, &element_path).map_err(|source| {
                    SchemaError::InvalidElement {
                        path: path.to_string(),
                        index,
                        source: Box::new(source),
                    }
                })?;
                out.push(checked);
            }
            Ok(Value::Array(out))
        }
        SchemaKind::Object => {
            let Some(object) = value.as_object() else {
                return Err(mismatch(path, schema.kind, value));
            };
            let Some(properties) = &schema.properties else {
                return Ok(value.clone());
            };
            let mut out = Map::new();
            for (name, prop_schema) in properties {
                if let Some(prop) = object.get(name) {
                    let prop_path = format!("{path}.{name}");
                    out.insert(name.clone(), validate_at(prop, prop_schema, &prop_path)?);
                }
            }
            Ok(Value::Object(out))
        }
    }
}

fn mismatch(path: &str, expected: SchemaKind, found: &Value) -> SchemaError {
    SchemaError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: value_kind(found),
    }
}

/// Returns the JSON kind name of a value.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
