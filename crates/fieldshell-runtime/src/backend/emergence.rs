//! `emergence` namespace: pure computation over the execution context.

use super::dispatcher::BackendDispatcher;
use super::step::object;
use super::{BackendError, BeyondAction, EmergenceAction, StepInput, StepResult};
use crate::field::{dynamics, Field};
use fieldshell_event::FieldEventKind;
use serde_json::{json, Value};

pub const EMERGENCE_COHERENCE: f64 = 0.7;
pub const EMERGENCE_ENERGY: f64 = 6.0;
pub const DEFAULT_FILTER_THRESHOLD: f64 = 0.5;

const DETECT_KEY: &str = "emergence.detect_patterns";

impl BackendDispatcher {
    pub(super) async fn emergence(
        &self,
        action: EmergenceAction,
        input: &StepInput,
    ) -> Result<StepResult, BackendError> {
        match action {
            EmergenceAction::DetectPatterns => Ok(detect_patterns(&input.field)),
            EmergenceAction::FilterPatterns => filter_patterns(input),
            // validation goes through the beyond namespace and its fallback
            EmergenceAction::Validate => self.beyond(BeyondAction::ValidateEmergence, input).await,
        }
    }
}

/// Whether the field is in the emergent regime.
#[must_use]
pub fn is_emergent(field: &Field) -> bool {
    field.coherence > EMERGENCE_COHERENCE && field.energy > EMERGENCE_ENERGY
}

fn detect_patterns(field: &Field) -> StepResult {
    let detected = is_emergent(field);
    let score = dynamics::emergence_score(field);

    let mut patterns: Vec<Value> = field
        .attractors
        .iter()
        .map(|a| {
            json!({
                "name": format!("{}_attractor", a.kind.name()),
                "type": a.kind,
                "strength": a.strength,
            })
        })
        .collect();
    if detected {
        patterns.push(json!({
            "name": "coherence_energy_resonance",
            "type": "resonance",
            "strength": score,
        }));
    }

    let data = object(json!({
        "emergenceDetected": detected,
        "patterns": patterns,
        "score": score,
    }));
    let result = StepResult::success(data);
    if detected {
        result.with_event(
            FieldEventKind::EmergenceDetected,
            json!({"score": score, "metrics": field.metrics()}),
        )
    } else {
        result
    }
}

fn filter_patterns(input: &StepInput) -> Result<StepResult, BackendError> {
    let threshold = input.number("threshold")?.unwrap_or(DEFAULT_FILTER_THRESHOLD);
    let candidates: Vec<Value> = input
        .result(DETECT_KEY)
        .and_then(|r| r.get("patterns"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let total = candidates.len();
    let kept: Vec<Value> = candidates
        .into_iter()
        .filter(|p| {
            p.get("strength")
                .and_then(Value::as_f64)
                .is_some_and(|s| s >= threshold)
        })
        .collect();

    Ok(StepResult::success(object(json!({
        "threshold": threshold,
        "removed": total - kept.len(),
        "patterns": kept,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dispatcher::test_support::{dispatcher, input};
    use crate::field::{Attractor, AttractorType, FieldSeed};
    use crate::protocol::Namespace;

    #[test]
    fn detection_requires_coherence_and_energy() {
        let quiet = detect_patterns(&Field::from_seed(
            fieldshell_types::FieldId::new(),
            FieldSeed::new(),
        ));
        assert_eq!(quiet.data["emergenceDetected"], false);
        assert!(quiet.events.is_empty());

        let active = detect_patterns(&Field::from_seed(
            fieldshell_types::FieldId::new(),
            FieldSeed::new()
                .coherence(0.9)
                .energy(8.0)
                .attractor(Attractor::new(AttractorType::Point, 0.4)),
        ));
        assert_eq!(active.data["emergenceDetected"], true);
        let patterns = active.data["patterns"].as_array().unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0]["name"], "point_attractor");
        assert_eq!(patterns[1]["name"], "coherence_energy_resonance");
        assert_eq!(active.events[0].0, FieldEventKind::EmergenceDetected);
    }

    #[tokio::test]
    async fn filter_keeps_strong_patterns() {
        let step_input = input(Namespace::Emergence, "filter_patterns", FieldSeed::new())
            .with_params(object(json!({"threshold": 0.6})))
            .with_results(object(json!({
                "emergence.detect_patterns": {
                    "status": "success",
                    "patterns": [
                        {"name": "a", "strength": 0.9},
                        {"name": "b", "strength": 0.3},
                        {"name": "c"}
                    ]
                }
            })));

        let result = dispatcher().dispatch(&step_input).await.unwrap();
        assert_eq!(result.data["patterns"], json!([{"name": "a", "strength": 0.9}]));
        assert_eq!(result.data["removed"], 2);
    }

    #[tokio::test]
    async fn filter_without_detection_is_empty() {
        let result = dispatcher()
            .dispatch(&input(Namespace::Emergence, "filter_patterns", FieldSeed::new()))
            .await
            .unwrap();
        assert_eq!(result.data["patterns"], json!([]));
    }

    #[tokio::test]
    async fn validate_uses_beyond_fallback() {
        let step_input = input(Namespace::Emergence, "validate", FieldSeed::new()).with_results(
            object(json!({
                "emergence.detect_patterns": {"emergenceDetected": true, "score": 0.8}
            })),
        );

        let result = dispatcher().dispatch(&step_input).await.unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.data["validated"], true);
    }
}
