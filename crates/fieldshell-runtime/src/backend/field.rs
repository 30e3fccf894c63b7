//! `field` namespace: local, synchronous, deterministic.
//!
//! Handlers never touch the store. They read the dispatch-time snapshot
//! and describe the change as a [`FieldDelta`], which the engine applies.

use super::step::object;
use super::{BackendError, FieldAction, StepInput, StepResult};
use crate::field::{Attractor, AttractorType, Dimension, FieldDelta};
use fieldshell_event::FieldEventKind;
use serde_json::{json, Value};

/// Coherence moves toward its target by at most this much per step.
pub const COHERENCE_STEP: f64 = 0.1;
pub const DEFAULT_COHERENCE_TARGET: f64 = 0.8;
pub const MAXIMIZED_COHERENCE: f64 = 0.95;
pub const MAXIMIZE_ENERGY_GAIN: f64 = 1.2;

const POINT_COHERENCE: f64 = 0.8;
const STRANGE_ENTROPY: f64 = 0.6;
const STRANGE_DAMPING: f64 = 0.7;

pub(super) fn handle(action: FieldAction, input: &StepInput) -> Result<StepResult, BackendError> {
    match action {
        FieldAction::Initialize => initialize(input),
        FieldAction::StabilizeCoherence => stabilize_coherence(input),
        FieldAction::AnalyzeAttractors => Ok(analyze_attractors(input)),
        FieldAction::MaximizeCoherence => Ok(maximize_coherence(input)),
        FieldAction::ActivateDimension => activate_dimension(input),
    }
}

fn initialize(input: &StepInput) -> Result<StepResult, BackendError> {
    let energy = input
        .number("energy")?
        .unwrap_or(crate::field::DEFAULT_ENERGY);
    let coherence = input
        .number("coherence")?
        .unwrap_or(crate::field::DEFAULT_COHERENCE);

    let delta = FieldDelta::new().energy(energy).coherence(coherence);
    let data = object(json!({
        "initialized": true,
        "energy": energy.max(0.0),
        "coherence": coherence.clamp(0.0, 1.0),
    }));
    Ok(StepResult::success(data).with_delta(delta))
}

fn stabilize_coherence(input: &StepInput) -> Result<StepResult, BackendError> {
    let target = input
        .number("target")?
        .unwrap_or(DEFAULT_COHERENCE_TARGET)
        .clamp(0.0, 1.0);
    let previous = input.field.coherence;
    let next = if previous < target {
        (previous + COHERENCE_STEP).min(target)
    } else {
        (previous - COHERENCE_STEP).max(target)
    };

    let data = object(json!({
        "coherence": next,
        "previousCoherence": previous,
        "target": target,
        "stabilized": (next - target).abs() < f64::EPSILON,
    }));
    Ok(StepResult::success(data).with_delta(FieldDelta::new().coherence(next)))
}

/// Derives attractors from the current energy, coherence and entropy.
///
/// Replaces the field's attractor list and reports one
/// `attractor_formed` event per attractor.
pub fn derive_attractors(energy: f64, coherence: f64, entropy: f64) -> Vec<Attractor> {
    let mut attractors = Vec::new();
    if coherence > POINT_COHERENCE {
        attractors.push(
            Attractor::new(AttractorType::Point, coherence * energy)
                .with_pattern("coherent_focus")
                .with_stability(coherence),
        );
    }
    if entropy > STRANGE_ENTROPY {
        attractors.push(
            Attractor::new(AttractorType::Strange, entropy * energy * STRANGE_DAMPING)
                .with_pattern("chaotic_exploration")
                .with_stability(1.0 - entropy),
        );
    }
    attractors
}

fn analyze_attractors(input: &StepInput) -> StepResult {
    let field = &input.field;
    let attractors = derive_attractors(field.energy, field.coherence, field.entropy);
    let serialized: Vec<Value> = attractors
        .iter()
        .map(|a| serde_json::to_value(a).unwrap_or(Value::Null))
        .collect();

    let mut result = StepResult::success(object(json!({
        "attractors": serialized,
        "count": attractors.len(),
    })));
    for attractor in &attractors {
        result = result.with_event(
            FieldEventKind::AttractorFormed,
            json!({"type": attractor.kind, "strength": attractor.strength}),
        );
    }
    result.with_delta(FieldDelta::new().attractors(attractors))
}

fn maximize_coherence(input: &StepInput) -> StepResult {
    let energy = input.field.energy * MAXIMIZE_ENERGY_GAIN;
    let data = object(json!({
        "coherence": MAXIMIZED_COHERENCE,
        "energy": energy,
    }));
    StepResult::success(data).with_delta(
        FieldDelta::new()
            .coherence(MAXIMIZED_COHERENCE)
            .energy(energy),
    )
}

fn activate_dimension(input: &StepInput) -> Result<StepResult, BackendError> {
    let name = input
        .text("dimension")?
        .ok_or_else(|| input.invalid("'dimension' is required"))?
        .to_string();
    let active = input.flag("active")?.unwrap_or(true);

    let mut dimension = input.field.dimensions.get(&name).cloned().unwrap_or(Dimension {
        weight: 0.0,
        active: false,
        phase: 0.0,
        amplitude: 1.0,
        coupling: 0.5,
    });
    let was_active = dimension.active;
    dimension.active = active;
    if let Some(weight) = input.number("weight")? {
        dimension.weight = weight.clamp(0.0, 1.0);
    }

    let data = object(json!({
        "dimension": name,
        "active": active,
        "previouslyActive": was_active,
        "weight": dimension.weight,
    }));
    Ok(StepResult::success(data.clone())
        .with_event(FieldEventKind::DimensionShift, Value::Object(data))
        .with_delta(FieldDelta::new().dimension(name, dimension)))
}
