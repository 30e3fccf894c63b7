//! Protocol shell definitions.
//!
//! A shell deserializes from the same JSON shape callers author by hand:
//!
//! ```json
//! {
//!   "intent": "Stabilize a drifting field",
//!   "inputSchema": { "target": { "type": "number", "min": 0, "max": 1 } },
//!   "process": [
//!     { "namespace": "field", "action": "stabilize_coherence",
//!       "params": { "target": 0.8 } },
//!     { "namespace": "emergence", "action": "detect_patterns",
//!       "conditions": [ { "field": "field.energy", "operator": "greater", "value": 6 } ] }
//!   ],
//!   "outputSchema": { "coherence": { "type": "number" } },
//!   "metadata": { "name": "stabilize", "version": "1.0.0" }
//! }
//! ```

use crate::schema::SchemaMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, versioned multi-step procedure. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolShell {
    pub intent: String,
    #[serde(default)]
    pub input_schema: SchemaMap,
    #[serde(default)]
    pub process: Vec<Step>,
    #[serde(default)]
    pub output_schema: SchemaMap,
    pub metadata: ProtocolMetadata,
}

impl ProtocolShell {
    /// Starts a shell with the given unique name.
    #[must_use]
    pub fn new(name: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            input_schema: SchemaMap::new(),
            process: Vec::new(),
            output_schema: SchemaMap::new(),
            metadata: ProtocolMetadata::new(name),
        }
    }

    /// Registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[must_use]
    pub fn input(mut self, name: impl Into<String>, schema: crate::schema::TypeSchema) -> Self {
        self.input_schema.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn output(mut self, name: impl Into<String>, schema: crate::schema::TypeSchema) -> Self {
        self.output_schema.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.process.push(step);
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.metadata.complexity = complexity;
        self
    }

    #[must_use]
    pub fn reliability(mut self, reliability: f64) -> Self {
        self.metadata.reliability = reliability;
        self
    }

    #[must_use]
    pub fn performance(mut self, profile: impl Into<String>) -> Self {
        self.metadata.performance_profile = profile.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMetadata {
    /// Unique registry key.
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub complexity: Complexity,
    /// In `[0, 1]`.
    #[serde(default = "default_reliability")]
    pub reliability: f64,
    #[serde(default)]
    pub performance_profile: String,
}

impl ProtocolMetadata {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            complexity: Complexity::default(),
            reliability: default_reliability(),
            performance_profile: String::new(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".into()
}

fn default_reliability() -> f64 {
    0.9
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    Transcendent,
}

/// Backend family a step is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Field,
    Recursive,
    Cognitive,
    Emergence,
    Braun,
    Beyond,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Self::Field,
        Self::Recursive,
        Self::Cognitive,
        Self::Emergence,
        Self::Braun,
        Self::Beyond,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Recursive => "recursive",
            Self::Cognitive => "cognitive",
            Self::Emergence => "emergence",
            Self::Braun => "braun",
            Self::Beyond => "beyond",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One namespace-scoped action within a shell's process list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub namespace: Namespace,
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// AND-combined; empty means always run.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Fire-and-forget when true.
    #[serde(default, rename = "async")]
    pub async_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Step {
    #[must_use]
    pub fn new(namespace: Namespace, action: impl Into<String>) -> Self {
        Self {
            namespace,
            action: action.into(),
            params: Map::new(),
            conditions: Vec::new(),
            async_mode: false,
            timeout_ms: None,
        }
    }

    /// Result key, `"namespace.action"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.namespace, self.action)
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn detached(mut self) -> Self {
        self.async_mode = true;
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equals,
    Greater,
    Less,
    Contains,
    Pattern,
    Emergence,
}

/// Guard on a step, evaluated against the execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path into `{field, params, results}`.
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl Condition {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            threshold: None,
        }
    }

    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}
