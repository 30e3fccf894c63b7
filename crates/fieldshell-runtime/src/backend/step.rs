//! Handler input and output.

use super::BackendError;
use crate::field::{Field, FieldDelta};
use crate::protocol::Step;
use fieldshell_event::FieldEventKind;
use fieldshell_types::ExecutionId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Everything a handler may read. Owned, so it can move into a detached task.
#[derive(Debug, Clone)]
pub struct StepInput {
    pub execution_id: ExecutionId,
    pub step: Step,
    /// Field state when the step was dispatched.
    pub field: Field,
    /// Validated protocol parameters.
    pub params: Map<String, Value>,
    /// Results of earlier steps, keyed `"namespace.action"`.
    pub results: Map<String, Value>,
}

impl StepInput {
    #[must_use]
    pub fn new(step: Step, field: Field) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            step,
            field,
            params: Map::new(),
            results: Map::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_results(mut self, results: Map<String, Value>) -> Self {
        self.results = results;
        self
    }

    /// Looks a parameter up in the step's own params, then in the
    /// protocol parameters. `null` counts as absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        let present = |v: &&Value| !v.is_null();
        self.step
            .params
            .get(name)
            .filter(present)
            .or_else(|| self.params.get(name).filter(present))
    }

    /// Protocol parameters overlaid with the step's own non-null params.
    #[must_use]
    pub fn merged_params(&self) -> Map<String, Value> {
        let mut merged = self.params.clone();
        for (k, v) in &self.step.params {
            if !v.is_null() {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    /// Numeric parameter.
    ///
    /// # Errors
    ///
    /// [`BackendError::InvalidParams`] if present but not a number.
    pub fn number(&self, name: &str) -> Result<Option<f64>, BackendError> {
        match self.param(name) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{name}' must be a number"))),
        }
    }

    /// String parameter.
    ///
    /// # Errors
    ///
    /// [`BackendError::InvalidParams`] if present but not a string.
    pub fn text(&self, name: &str) -> Result<Option<&str>, BackendError> {
        match self.param(name) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{name}' must be a string"))),
        }
    }

    /// Parameter as display text: strings verbatim, other values as JSON,
    /// absent as empty. Never fails, for fallback paths.
    #[must_use]
    pub fn rendered(&self, name: &str) -> String {
        match self.param(name) {
            None => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Boolean parameter.
    ///
    /// # Errors
    ///
    /// [`BackendError::InvalidParams`] if present but not a boolean.
    pub fn flag(&self, name: &str) -> Result<Option<bool>, BackendError> {
        match self.param(name) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{name}' must be a boolean"))),
        }
    }

    /// Result of an earlier step.
    #[must_use]
    pub fn result(&self, key: &str) -> Option<&Map<String, Value>> {
        self.results.get(key).and_then(Value::as_object)
    }

    /// The step's own timeout, or `default`.
    #[must_use]
    pub fn timeout(&self, default: Duration) -> Duration {
        self.step.timeout_ms.map_or(default, Duration::from_millis)
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> BackendError {
        BackendError::invalid_params(self.step.key(), message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    /// A collaborator was unusable; the data is a local substitute.
    Fallback,
    /// A non-raising failure (`success: false` compute results).
    Failed,
    /// Recorded for async steps in place of their real result.
    AsyncStarted,
}

/// What a handler hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub status: StepStatus,
    pub data: Map<String, Value>,
    /// Applied by the engine through the field store.
    pub delta: Option<FieldDelta>,
    /// Published by the engine after the delta is applied.
    pub events: Vec<(FieldEventKind, Value)>,
}

impl StepResult {
    #[must_use]
    pub fn new(status: StepStatus, data: Map<String, Value>) -> Self {
        Self {
            status,
            data,
            delta: None,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn success(data: Map<String, Value>) -> Self {
        Self::new(StepStatus::Success, data)
    }

    /// The placeholder recorded for an async step.
    #[must_use]
    pub fn async_started() -> Self {
        Self::new(StepStatus::AsyncStarted, Map::new())
    }

    #[must_use]
    pub fn with_delta(mut self, delta: FieldDelta) -> Self {
        self.delta = Some(delta);
        self
    }

    #[must_use]
    pub fn with_event(mut self, kind: FieldEventKind, data: Value) -> Self {
        self.events.push((kind, data));
        self
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.status == StepStatus::Fallback
    }

    /// The value stored under `results["namespace.action"]`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(
            "status".into(),
            serde_json::to_value(self.status).unwrap_or(Value::Null),
        );
        for (k, v) in &self.data {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

/// Builds a JSON object map from `json!`-style pairs.
pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSeed;
    use crate::protocol::Namespace;
    use fieldshell_types::FieldId;
    use serde_json::json;

    fn input() -> StepInput {
        let step = Step::new(Namespace::Recursive, "analyze")
            .param("depth", json!(4))
            .param("query", Value::Null);
        let field = Field::from_seed(FieldId::new(), FieldSeed::new());
        StepInput::new(step, field).with_params(object(json!({
            "query": "why",
            "depth": 2,
            "flag": "yes",
        })))
    }

    #[test]
    fn step_params_shadow_protocol_params() {
        let input = input();
        assert_eq!(input.number("depth").unwrap(), Some(4.0));
        // null in the step falls through to the protocol params
        assert_eq!(input.text("query").unwrap(), Some("why"));
        assert_eq!(input.number("missing").unwrap(), None);
    }

    #[test]
    fn merged_params_prefer_step() {
        let merged = input().merged_params();
        assert_eq!(merged["depth"], 4);
        assert_eq!(merged["query"], "why");
        assert_eq!(merged["flag"], "yes");
    }

    #[test]
    fn rendered_never_fails() {
        let input = input();
        assert_eq!(input.rendered("query"), "why");
        assert_eq!(input.rendered("depth"), "4");
        assert_eq!(input.rendered("missing"), "");
    }

    #[test]
    fn wrong_param_type_is_invalid() {
        let err = input().flag("flag").unwrap_err();
        assert!(matches!(err, BackendError::InvalidParams { ref step, .. } if step == "recursive.analyze"));
    }

    #[test]
    fn timeout_prefers_step_value() {
        let mut input = input();
        assert_eq!(input.timeout(Duration::from_secs(10)), Duration::from_secs(10));
        input.step.timeout_ms = Some(250);
        assert_eq!(input.timeout(Duration::from_secs(10)), Duration::from_millis(250));
    }

    #[test]
    fn to_value_carries_status() {
        let result = StepResult::new(StepStatus::Fallback, object(json!({"confidence": 0.7})));
        assert_eq!(
            result.to_value(),
            json!({"status": "fallback", "confidence": 0.7})
        );
        assert_eq!(StepResult::async_started().to_value(), json!({"status": "async_started"}));
    }
}
