//! `recursive` and `cognitive` namespaces.
//!
//! Both go through the [`CognitiveCollaborator`](super::CognitiveCollaborator)
//! with `operation = "namespace.action"`. Any failure (absent, timed out,
//! erroring, or `success: false`) produces a local fallback instead.

use super::dispatcher::BackendDispatcher;
use super::step::object;
use super::{
    BackendError, CognitiveAction, CognitiveRequest, CollaboratorError, RecursiveAction,
    StepInput, StepResult,
};
use crate::field::Field;
use crate::frame::FrameDraft;
use fieldshell_types::RequestId;
use serde_json::{json, Map, Value};
use tracing::warn;

const COLLABORATOR: &str = "cognitive";

pub const DEFAULT_DEPTH: f64 = 3.0;
const ANALYZE_CONFIDENCE: f64 = 0.7;
const REFINE_GAIN: f64 = 0.1;
const REFINE_CEILING: f64 = 0.85;
const REASON_CONFIDENCE: f64 = 0.7;
const PATTERN_CONFIDENCE: f64 = 0.65;
const INSIGHT_CONFIDENCE: f64 = 0.7;
const FALLBACK_FLOOR: f64 = 0.6;

impl BackendDispatcher {
    pub(super) async fn recursive(
        &self,
        action: RecursiveAction,
        input: &StepInput,
    ) -> Result<StepResult, BackendError> {
        let answer = self.ask_cognitive(input).await;
        Ok(match (action, answer) {
            (_, Ok(data)) => StepResult::success(data),
            (RecursiveAction::Analyze, Err(cause)) => {
                self.fallback(input, &cause, fallback_analysis(input))
            }
            (RecursiveAction::Refine, Err(cause)) => {
                self.fallback(input, &cause, fallback_refinement(input))
            }
        })
    }

    pub(super) async fn cognitive(
        &self,
        action: CognitiveAction,
        input: &StepInput,
    ) -> Result<StepResult, BackendError> {
        let answer = self.ask_cognitive(input).await;
        let mut result = match (action, answer) {
            (_, Ok(data)) => StepResult::success(data),
            (CognitiveAction::Reason, Err(cause)) => {
                self.fallback(input, &cause, fallback_reasoning(input))
            }
            (CognitiveAction::ExtractPatterns, Err(cause)) => {
                let data = object(json!({
                    "patterns": field_labels(&input.field),
                    "confidence": PATTERN_CONFIDENCE,
                }));
                self.fallback(input, &cause, data)
            }
            (CognitiveAction::GenerateInsight, Err(cause)) => {
                self.fallback(input, &cause, fallback_insight(&input.field))
            }
        };

        if action == CognitiveAction::GenerateInsight {
            self.record_insight(input, &mut result.data);
        }
        Ok(result)
    }

    /// Sends the step to the cognitive collaborator and flattens the answer.
    async fn ask_cognitive(&self, input: &StepInput) -> Result<Map<String, Value>, CollaboratorError> {
        let collaborator = self
            .cognitive
            .as_ref()
            .ok_or_else(|| CollaboratorError::Unavailable(COLLABORATOR.into()))?;

        let operation = input.step.key();
        let request = CognitiveRequest {
            id: RequestId::new(),
            operation: operation.clone(),
            params: input.merged_params(),
            field_snapshot: input.field.clone(),
        };
        let response = self
            .call_with_timeout(COLLABORATOR, input, collaborator.process(request))
            .await?;
        if !response.success {
            return Err(CollaboratorError::Failed(format!(
                "{operation} reported success: false"
            )));
        }

        let mut data = match response.result {
            Value::Object(map) => map,
            other => object(json!({ "analysis": other })),
        };
        data.insert("source".into(), Value::from("collaborator"));
        data.insert("workerId".into(), Value::from(response.metadata.worker_id));
        data.insert("patterns".into(), json!(response.patterns));
        data.insert(
            "processingTimeMs".into(),
            Value::from(response.metadata.processing_time_ms),
        );
        Ok(data)
    }

    /// Stores a generated insight as a context frame and adds its id to `data`.
    fn record_insight(&self, input: &StepInput, data: &mut Map<String, Value>) {
        let content = data
            .get("insight")
            .and_then(Value::as_str)
            .map_or_else(|| Value::Object(data.clone()).to_string(), str::to_string);
        let confidence = data
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(INSIGHT_CONFIDENCE)
            .clamp(0.0, 1.0);
        let source = data
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or(COLLABORATOR)
            .to_string();

        let draft = FrameDraft::new(content)
            .frame_type("insight")
            .importance(confidence)
            .confidence(confidence)
            .source(source);
        match self.frames.add(draft) {
            Ok(frame_id) => {
                data.insert("frameId".into(), Value::from(frame_id.to_string()));
            }
            Err(e) => {
                warn!(
                    execution_id = %input.execution_id,
                    error = %e,
                    "Insight frame not stored"
                );
            }
        }
    }
}

/// Coarse labels derived from field state.
#[must_use]
pub fn field_labels(field: &Field) -> Vec<&'static str> {
    let mut labels = Vec::new();
    if field.coherence > 0.7 {
        labels.push("high_coherence");
    }
    if field.energy > 6.0 {
        labels.push("high_energy");
    }
    if field.entropy > 0.6 {
        labels.push("high_entropy");
    }
    if labels.is_empty() {
        labels.push("stable");
    }
    labels
}

fn fallback_analysis(input: &StepInput) -> Map<String, Value> {
    let query = input.rendered("query");
    let depth = input.number("depth").ok().flatten().unwrap_or(DEFAULT_DEPTH);
    object(json!({
        "analysis": format!("Local recursive analysis of '{query}' to depth {depth}"),
        "depth": depth,
        "confidence": ANALYZE_CONFIDENCE,
        "patterns": field_labels(&input.field),
    }))
}

fn fallback_refinement(input: &StepInput) -> Map<String, Value> {
    let previous = input.result("recursive.analyze");
    let prior = previous
        .and_then(|r| r.get("confidence"))
        .and_then(Value::as_f64)
        .unwrap_or(ANALYZE_CONFIDENCE);
    let analysis = previous
        .and_then(|r| r.get("analysis"))
        .cloned()
        .unwrap_or(Value::Null);
    object(json!({
        "analysis": analysis,
        "refined": true,
        "confidence": (prior + REFINE_GAIN).clamp(FALLBACK_FLOOR, REFINE_CEILING),
    }))
}

fn fallback_reasoning(input: &StepInput) -> Map<String, Value> {
    let context = input.rendered("context");
    object(json!({
        "reasoning": format!(
            "Local reasoning over '{context}' at coherence {:.2}",
            input.field.coherence
        ),
        "confidence": REASON_CONFIDENCE,
    }))
}

fn fallback_insight(field: &Field) -> Map<String, Value> {
    object(json!({
        "insight": format!(
            "Field at coherence {:.2} and energy {:.2} shows {}",
            field.coherence,
            field.energy,
            field_labels(field).join(", ")
        ),
        "confidence": INSIGHT_CONFIDENCE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dispatcher::test_support::{dispatcher, input};
    use crate::backend::{CognitiveCollaborator, CognitiveResponse, StepStatus};
    use crate::field::FieldSeed;
    use crate::protocol::Namespace;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Echo {
        success: bool,
    }

    #[async_trait]
    impl CognitiveCollaborator for Echo {
        async fn process(
            &self,
            request: CognitiveRequest,
        ) -> Result<CognitiveResponse, CollaboratorError> {
            let mut response = CognitiveResponse::ok(
                json!({"analysis": request.operation, "confidence": 0.95}),
                "echo-1",
            );
            response.success = self.success;
            response.patterns = vec!["loop".into()];
            Ok(response)
        }
    }

    struct Stalled;

    #[async_trait]
    impl CognitiveCollaborator for Stalled {
        async fn process(
            &self,
            _request: CognitiveRequest,
        ) -> Result<CognitiveResponse, CollaboratorError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn analyze_without_collaborator_falls_back() {
        let dispatcher = dispatcher();
        let step_input = input(Namespace::Recursive, "analyze", FieldSeed::new())
            .with_params(object(json!({"query": "why"})));

        let result = dispatcher.dispatch(&step_input).await.unwrap();
        assert_eq!(result.status, StepStatus::Fallback);
        assert_eq!(result.data["source"], "fallback");
        assert_eq!(result.data["depth"], 3.0);
        let confidence = result.data["confidence"].as_f64().unwrap();
        assert!((0.6..=0.9).contains(&confidence));
    }

    #[tokio::test]
    async fn misshapen_params_still_fall_back() {
        let dispatcher = dispatcher();
        let step_input = input(Namespace::Recursive, "analyze", FieldSeed::new())
            .with_params(object(json!({"query": 42, "depth": "deep"})));

        let result = dispatcher.dispatch(&step_input).await.unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.data["depth"], 3.0);
        assert!(result.data["analysis"].as_str().unwrap().contains("'42'"));

        let step_input = input(Namespace::Cognitive, "reason", FieldSeed::new())
            .with_params(object(json!({"context": ["a", "b"]})));
        let result = dispatcher.dispatch(&step_input).await.unwrap();
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn collaborator_answer_is_flattened() {
        let dispatcher = dispatcher().with_cognitive(Arc::new(Echo { success: true }));
        let result = dispatcher
            .dispatch(&input(Namespace::Recursive, "analyze", FieldSeed::new()))
            .await
            .unwrap();

        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.data["analysis"], "recursive.analyze");
        assert_eq!(result.data["source"], "collaborator");
        assert_eq!(result.data["workerId"], "echo-1");
        assert_eq!(result.data["patterns"], json!(["loop"]));
    }

    #[tokio::test]
    async fn unsuccessful_response_falls_back() {
        let dispatcher = dispatcher().with_cognitive(Arc::new(Echo { success: false }));
        let result = dispatcher
            .dispatch(&input(Namespace::Cognitive, "reason", FieldSeed::new()))
            .await
            .unwrap();
        assert!(result.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_collaborator_times_out_into_fallback() {
        let dispatcher = dispatcher().with_cognitive(Arc::new(Stalled));
        let mut step_input = input(Namespace::Recursive, "refine", FieldSeed::new());
        step_input.step.timeout_ms = Some(200);
        step_input = step_input.with_results(object(json!({
            "recursive.analyze": {"status": "fallback", "confidence": 0.7, "analysis": "x"}
        })));

        let result = dispatcher.dispatch(&step_input).await.unwrap();
        assert!(result.is_fallback());
        assert!((result.data["confidence"].as_f64().unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(result.data["refined"], true);
    }

    #[tokio::test]
    async fn generate_insight_stores_a_frame() {
        let dispatcher = dispatcher();
        let result = dispatcher
            .dispatch(&input(Namespace::Cognitive, "generate_insight", FieldSeed::new()))
            .await
            .unwrap();

        assert!(result.is_fallback());
        let frame_id = result.data["frameId"].as_str().unwrap().parse().unwrap();
        let frame = dispatcher.frames.get(frame_id).unwrap();
        assert_eq!(frame.metadata.frame_type, "insight");
        assert_eq!(frame.metadata.source, "fallback");
        assert!((frame.metadata.importance - 0.7).abs() < 1e-12);
    }

    #[test]
    fn labels_follow_field_state() {
        let calm = Field::from_seed(fieldshell_types::FieldId::new(), FieldSeed::new());
        assert_eq!(field_labels(&calm), vec!["stable"]);

        let hot = Field::from_seed(
            fieldshell_types::FieldId::new(),
            FieldSeed::new().coherence(0.9).energy(8.0),
        );
        assert_eq!(field_labels(&hot), vec!["high_coherence", "high_energy"]);
    }
}
