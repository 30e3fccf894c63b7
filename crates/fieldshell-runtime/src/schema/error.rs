//! Schema validation errors.
//!
//! | Variant | Code |
//! |---------|------|
//! | [`SchemaError::TypeMismatch`] | `SCHEMA_TYPE_MISMATCH` |
//! | [`SchemaError::Range`] | `SCHEMA_RANGE` |
//! | [`SchemaError::Pattern`] | `SCHEMA_PATTERN` |
//! | [`SchemaError::InvalidPattern`] | `SCHEMA_INVALID_PATTERN` |
//! | [`SchemaError::MissingParameter`] | `SCHEMA_MISSING_PARAMETER` |
//! | [`SchemaError::InvalidElement`] | `SCHEMA_INVALID_ELEMENT` |
//!
//! None are recoverable: the same input fails the same way on retry.

use super::SchemaKind;
use fieldshell_types::ErrorCode;
use thiserror::Error;

/// Validation failure, carrying the path of the offending value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Value is not of the declared kind.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: SchemaKind,
        found: &'static str,
    },

    /// Number outside its inclusive bounds.
    #[error("{path}: {value} is outside [{}, {}]", fmt_bound(.min), fmt_bound(.max))]
    Range {
        path: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// String does not match the declared pattern.
    #[error("{path}: value does not match pattern '{pattern}'")]
    Pattern { path: String, pattern: String },

    /// The declared pattern is not a valid regular expression.
    #[error("{path}: invalid pattern '{pattern}'")]
    InvalidPattern { path: String, pattern: String },

    /// Required top-level parameter is absent.
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    /// An array element failed validation.
    #[error("invalid element {index} in {path}: {source}")]
    InvalidElement {
        path: String,
        index: usize,
        #[source]
        source: Box<SchemaError>,
    },
}

fn fmt_bound(bound: &Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

impl ErrorCode for SchemaError {
    fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "SCHEMA_TYPE_MISMATCH",
            Self::Range { .. } => "SCHEMA_RANGE",
            Self::Pattern { .. } => "SCHEMA_PATTERN",
            Self::InvalidPattern { .. } => "SCHEMA_INVALID_PATTERN",
            Self::MissingParameter { .. } => "SCHEMA_MISSING_PARAMETER",
            Self::InvalidElement { .. } => "SCHEMA_INVALID_ELEMENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldshell_types::assert_error_codes;

    fn all_variants() -> Vec<SchemaError> {
        vec![
            SchemaError::TypeMismatch {
                path: "x".into(),
                expected: SchemaKind::Number,
                found: "string",
            },
            SchemaError::Range {
                path: "x".into(),
                value: 2.0,
                min: Some(0.0),
                max: Some(1.0),
            },
            SchemaError::Pattern {
                path: "x".into(),
                pattern: "^a$".into(),
            },
            SchemaError::InvalidPattern {
                path: "x".into(),
                pattern: "(".into(),
            },
            SchemaError::MissingParameter { name: "x".into() },
            SchemaError::InvalidElement {
                path: "x".into(),
                index: 0,
                source: Box::new(SchemaError::MissingParameter { name: "y".into() }),
            },
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "SCHEMA_");
    }

    #[test]
    fn range_display_shows_bounds() {
        let err = SchemaError::Range {
            path: "depth".into(),
            value: 12.0,
            min: Some(1.0),
            max: None,
        };
        assert_eq!(err.to_string(), "depth: 12 is outside [1, -]");
    }

    #[test]
    fn element_display_includes_index() {
        let err = SchemaError::InvalidElement {
            path: "tags".into(),
            index: 2,
            source: Box::new(SchemaError::TypeMismatch {
                path: "tags[2]".into(),
                expected: SchemaKind::String,
                found: "number",
            }),
        };
        assert!(err.to_string().starts_with("invalid element 2 in tags:"));
    }
}
