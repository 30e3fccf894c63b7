//! `beyond` namespace: named functions on the transcendent collaborator.
//!
//! A function the collaborator does not register is a fallback trigger,
//! like an absent collaborator. Any result whose `transcendenceLevel`
//! reaches the configured threshold reports `transcendence_achieved`.

use super::cognitive::field_labels;
use super::dispatcher::BackendDispatcher;
use super::emergence::is_emergent;
use super::step::object;
use super::{BackendError, BeyondAction, CollaboratorError, StepInput, StepResult};
use crate::field::dynamics;
use fieldshell_event::FieldEventKind;
use serde_json::{json, Map, Value};

const COLLABORATOR: &str = "transcendent";

const TRANSCEND_BASE: f64 = 0.6;
const TRANSCEND_COHERENCE_GAIN: f64 = 0.3;
const SYNTHESIS_CONFIDENCE: f64 = 0.7;
const VALIDATION_CONFIDENCE: f64 = 0.65;

impl BackendDispatcher {
    pub(super) async fn beyond(
        &self,
        action: BeyondAction,
        input: &StepInput,
    ) -> Result<StepResult, BackendError> {
        let result = match self.call_transcendent(action.name(), input).await {
            Ok(data) => StepResult::success(data),
            Err(cause) => {
                let data = match action {
                    BeyondAction::TranscendContext => fallback_transcendence(input),
                    BeyondAction::SynthesizeKnowledge => fallback_synthesis(input),
                    BeyondAction::ValidateEmergence => fallback_validation(input),
                };
                self.fallback(input, &cause, data)
            }
        };

        let level = result.data.get("transcendenceLevel").and_then(Value::as_f64);
        Ok(match level {
            Some(level) if level >= self.config.transcendence_threshold => result.with_event(
                FieldEventKind::TranscendenceAchieved,
                json!({"level": level, "step": input.step.key()}),
            ),
            _ => result,
        })
    }

    async fn call_transcendent(
        &self,
        function: &str,
        input: &StepInput,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        let collaborator = self
            .transcendent
            .as_ref()
            .ok_or_else(|| CollaboratorError::Unavailable(COLLABORATOR.into()))?;
        if !collaborator.has_function(function) {
            return Err(CollaboratorError::MissingFunction(function.to_string()));
        }

        let mut params = input.merged_params();
        params.insert("fieldState".into(), input.field.metrics());
        let value = self
            .call_with_timeout(
                COLLABORATOR,
                input,
                collaborator.call(function, Value::Object(params)),
            )
            .await?;

        let mut data = match value {
            Value::Object(map) => map,
            other => object(json!({ "result": other })),
        };
        data.insert("source".into(), Value::from("collaborator"));
        Ok(data)
    }
}

fn fallback_transcendence(input: &StepInput) -> Map<String, Value> {
    let context = input.rendered("context");
    let level = TRANSCEND_BASE + TRANSCEND_COHERENCE_GAIN * input.field.coherence;
    let insights: Vec<String> = field_labels(&input.field)
        .into_iter()
        .map(|label| format!("context shows {label}"))
        .collect();
    object(json!({
        "transcendedContext": format!("{context} (locally expanded)"),
        "transcendenceLevel": level,
        "insights": insights,
        "confidence": level,
    }))
}

fn fallback_synthesis(input: &StepInput) -> Map<String, Value> {
    let sources: Vec<&str> = input
        .param("sources")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let insights = input
        .result("beyond.transcend_context")
        .and_then(|r| r.get("insights"))
        .cloned()
        .unwrap_or_else(|| json!([]));
    object(json!({
        "synthesis": format!("Local synthesis across {} source(s)", sources.len()),
        "sourceCount": sources.len(),
        "insights": insights,
        "confidence": SYNTHESIS_CONFIDENCE,
    }))
}

fn fallback_validation(input: &StepInput) -> Map<String, Value> {
    let detection = input.result("emergence.detect_patterns");
    let detected = detection
        .and_then(|r| r.get("emergenceDetected"))
        .and_then(Value::as_bool)
        .unwrap_or_else(|| is_emergent(&input.field));
    let score = detection
        .and_then(|r| r.get("score"))
        .and_then(Value::as_f64)
        .unwrap_or_else(|| dynamics::emergence_score(&input.field));
    object(json!({
        "validated": detected,
        "validationScore": score,
        "confidence": VALIDATION_CONFIDENCE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dispatcher::test_support::{dispatcher, input};
    use crate::backend::{FnTranscendent, StepStatus};
    use crate::field::FieldSeed;
    use crate::protocol::Namespace;
    use std::sync::Arc;

    #[tokio::test]
    async fn registered_function_is_called() {
        let functions = FnTranscendent::new().with_function("transcend_context", |params| {
            Ok(json!({
                "transcendenceLevel": 0.9,
                "coherenceSeen": params["fieldState"]["coherence"],
            }))
        });
        let dispatcher = dispatcher().with_transcendent(Arc::new(functions));

        let result = dispatcher
            .dispatch(&input(Namespace::Beyond, "transcend_context", FieldSeed::new()))
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.data["source"], "collaborator");
        assert_eq!(result.data["coherenceSeen"], 0.5);
        assert_eq!(result.events[0].0, FieldEventKind::TranscendenceAchieved);
    }

    #[tokio::test]
    async fn missing_function_falls_back() {
        let functions = FnTranscendent::new().with_function("transcend_context", |_| Ok(json!({})));
        let dispatcher = dispatcher().with_transcendent(Arc::new(functions));

        let result = dispatcher
            .dispatch(&input(Namespace::Beyond, "synthesize_knowledge", FieldSeed::new()))
            .await
            .unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.data["confidence"], 0.7);
    }

    #[tokio::test]
    async fn non_text_context_still_falls_back() {
        let step_input = input(Namespace::Beyond, "transcend_context", FieldSeed::new())
            .with_params(object(json!({"context": {"topic": "tides"}})));

        let result = dispatcher().dispatch(&step_input).await.unwrap();
        assert!(result.is_fallback());
        let context = result.data["transcendedContext"].as_str().unwrap();
        assert!(context.contains("tides"));
    }

    #[tokio::test]
    async fn fallback_level_tracks_coherence() {
        let dispatcher = dispatcher();

        let low = dispatcher
            .dispatch(&input(Namespace::Beyond, "transcend_context", FieldSeed::new()))
            .await
            .unwrap();
        let level = low.data["transcendenceLevel"].as_f64().unwrap();
        assert!((level - 0.75).abs() < 1e-12);
        assert!(low.events.is_empty());

        let high = dispatcher
            .dispatch(&input(
                Namespace::Beyond,
                "transcend_context",
                FieldSeed::new().coherence(0.95),
            ))
            .await
            .unwrap();
        assert_eq!(high.events.len(), 1);
        assert_eq!(high.events[0].0, FieldEventKind::TranscendenceAchieved);
    }

    #[tokio::test]
    async fn validation_falls_back_to_field_state() {
        let result = dispatcher()
            .dispatch(&input(Namespace::Beyond, "validate_emergence", FieldSeed::new()))
            .await
            .unwrap();
        assert_eq!(result.data["validated"], false);
        assert_eq!(result.data["workerId"], "fallback");
    }
}
