//! Typed-schema language.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named schemas, as used by a protocol's input and output declarations.
pub type SchemaMap = BTreeMap<String, TypeSchema>;

/// Primitive or container kind of a [`TypeSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// Returns the lowercase kind name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema for one value.
///
/// Constraints that do not apply to the kind are ignored (a `pattern`
/// on a number schema has no effect).
///
/// # Example
///
/// ```
/// use fieldshell_runtime::schema::{SchemaKind, TypeSchema};
///
/// let depth = TypeSchema::number().range(1.0, 10.0).required();
/// assert_eq!(depth.kind, SchemaKind::Number);
/// assert!(depth.required);
///
/// let tags = TypeSchema::array(TypeSchema::string().pattern("^[a-z]+$"));
/// assert!(tags.items.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSchema {
    /// Value kind.
    #[serde(rename = "type")]
    pub kind: SchemaKind,

    /// Top-level parameters only: absence fails validation.
    #[serde(default)]
    pub required: bool,

    /// Inclusive lower bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Regular expression a string must match (search semantics).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<TypeSchema>>,

    /// Property schemas for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SchemaMap>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeSchema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            min: None,
            max: None,
            pattern: None,
            items: None,
            properties: None,
            description: None,
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// Array whose elements must all match `items`.
    #[must_use]
    pub fn array(items: TypeSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaKind::Array)
        }
    }

    /// Array with unconstrained elements.
    #[must_use]
    pub fn any_array() -> Self {
        Self::of(SchemaKind::Array)
    }

    /// Object whose known properties are validated.
    #[must_use]
    pub fn object(properties: SchemaMap) -> Self {
        Self {
            properties: Some(properties),
            ..Self::of(SchemaKind::Object)
        }
    }

    /// Object with unconstrained properties.
    #[must_use]
    pub fn any_object() -> Self {
        Self::of(SchemaKind::Object)
    }

    /// Marks the schema as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets an inclusive lower bound.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets an inclusive upper bound.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets both inclusive bounds.
    #[must_use]
    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    /// Sets the string pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
