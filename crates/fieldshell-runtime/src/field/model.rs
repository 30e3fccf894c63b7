//! Field state types.

use chrono::{DateTime, Utc};
use fieldshell_types::FieldId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_ENERGY: f64 = 5.0;
pub const DEFAULT_COHERENCE: f64 = 0.5;
pub const DEFAULT_ENTROPY: f64 = 0.3;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

pub const MIN_TEMPERATURE: f64 = 0.1;
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Default dimensions: (name, weight, active, phase).
const DEFAULT_DIMENSIONS: [(&str, f64, bool, f64); 6] = [
    ("semantic", 0.30, true, 0.0),
    ("temporal", 0.20, true, 0.25),
    ("emergent", 0.25, true, 0.5),
    ("cognitive", 0.15, true, 0.75),
    ("execution", 0.10, false, 1.0),
    ("transcendent", 0.0, false, 1.25),
];

/// A mutable simulated state container.
///
/// Invariants, maintained by [`Field::clamp`]:
///
/// | Quantity | Range |
/// |----------|-------|
/// | `energy` | `≥ 0` |
/// | `coherence` | `[0, 1]` |
/// | `entropy` | `[0, 1]` |
/// | `temperature` | `[0.1, 2.0]` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    pub energy: f64,
    pub coherence: f64,
    pub entropy: f64,
    pub temperature: f64,
    pub attractors: Vec<Attractor>,
    pub dimensions: BTreeMap<String, Dimension>,
    pub metadata: FieldMetadata,
}

impl Field {
    /// Builds a field from a seed, applying defaults and clamping.
    #[must_use]
    pub fn from_seed(id: FieldId, seed: FieldSeed) -> Self {
        let now = Utc::now();
        let mut dimensions = default_dimensions();
        for (name, dimension) in seed.dimensions {
            dimensions.insert(name, dimension);
        }

        let mut field = Self {
            id,
            energy: seed.energy.unwrap_or(DEFAULT_ENERGY),
            coherence: seed.coherence.unwrap_or(DEFAULT_COHERENCE),
            entropy: seed.entropy.unwrap_or(DEFAULT_ENTROPY),
            temperature: seed.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            attractors: seed.attractors,
            dimensions,
            metadata: FieldMetadata {
                created: now,
                updated: now,
                version: 1,
                session_id: seed.session_id,
                tags: seed.tags,
            },
        };
        field.clamp();
        field
    }

    /// Forces every scalar back into its invariant range.
    ///
    /// Non-finite values are replaced by the defaults.
    pub fn clamp(&mut self) {
        self.energy = finite_or(self.energy, DEFAULT_ENERGY).max(0.0);
        self.coherence = finite_or(self.coherence, DEFAULT_COHERENCE).clamp(0.0, 1.0);
        self.entropy = finite_or(self.entropy, DEFAULT_ENTROPY).clamp(0.0, 1.0);
        self.temperature =
            finite_or(self.temperature, DEFAULT_TEMPERATURE).clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
    }

    /// Applies a delta, then clamps.
    pub fn apply(&mut self, delta: &FieldDelta) {
        if let Some(energy) = delta.energy {
            self.energy = energy;
        }
        if let Some(coherence) = delta.coherence {
            self.coherence = coherence;
        }
        if let Some(entropy) = delta.entropy {
            self.entropy = entropy;
        }
        if let Some(temperature) = delta.temperature {
            self.temperature = temperature;
        }
        if let Some(attractors) = &delta.attractors {
            self.attractors.clone_from(attractors);
        }
        for (name, dimension) in &delta.dimensions {
            self.dimensions.insert(name.clone(), dimension.clone());
        }
        for tag in &delta.tags {
            if !self.metadata.tags.contains(tag) {
                self.metadata.tags.push(tag.clone());
            }
        }
        self.clamp();
    }

    /// Sum of all dimension weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.dimensions.values().map(|d| d.weight).sum()
    }

    /// Mean attractor strength, or 0 with no attractors.
    #[must_use]
    pub fn mean_attractor_strength(&self) -> f64 {
        if self.attractors.is_empty() {
            return 0.0;
        }
        self.attractors.iter().map(|a| a.strength).sum::<f64>() / self.attractors.len() as f64
    }

    /// Key metrics, as carried in event payloads.
    #[must_use]
    pub fn metrics(&self) -> serde_json::Value {
        serde_json::json!({
            "energy": self.energy,
            "coherence": self.coherence,
            "entropy": self.entropy,
            "temperature": self.temperature,
            "attractors": self.attractors.len(),
            "version": self.metadata.version,
        })
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn default_dimensions() -> BTreeMap<String, Dimension> {
    DEFAULT_DIMENSIONS
        .iter()
        .map(|&(name, weight, active, phase)| {
            (
                name.to_string(),
                Dimension {
                    weight,
                    active,
                    phase,
                    amplitude: 1.0,
                    coupling: 0.5,
                },
            )
        })
        .collect()
}

/// One named dimension of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub weight: f64,
    pub active: bool,
    pub phase: f64,
    pub amplitude: f64,
    pub coupling: f64,
}

/// Bookkeeping carried alongside the field state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub created: DateTime<Utc>,
    /// Monotonically non-decreasing.
    pub updated: DateTime<Utc>,
    /// Starts at 1, incremented on every mutation.
    pub version: u64,
    pub session_id: Option<String>,
    pub tags: Vec<String>,
}

/// Dynamical classification of an attractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttractorType {
    Strange,
    Cyclic,
    Point,
    Torus,
    Emergent,
}

impl AttractorType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strange => "strange",
            Self::Cyclic => "cyclic",
            Self::Point => "point",
            Self::Torus => "torus",
            Self::Emergent => "emergent",
        }
    }
}

/// A derived structural feature of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attractor {
    #[serde(rename = "type")]
    pub kind: AttractorType,
    pub strength: f64,
    pub patterns: BTreeSet<String>,
    pub resonance_frequency: f64,
    pub stability: f64,
}

impl Attractor {
    #[must_use]
    pub fn new(kind: AttractorType, strength: f64) -> Self {
        Self {
            kind,
            strength,
            patterns: BTreeSet::new(),
            resonance_frequency: 1.0,
            stability: 0.5,
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.insert(pattern.into());
        self
    }

    #[must_use]
    pub fn with_stability(mut self, stability: f64) -> Self {
        self.stability = stability;
        self
    }

    #[must_use]
    pub fn with_resonance(mut self, frequency: f64) -> Self {
        self.resonance_frequency = frequency;
        self
    }
}

/// Initial partial field passed to `create`.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::field::FieldSeed;
///
/// let seed = FieldSeed::new().energy(8.0).session("s-1").tag("demo");
/// assert_eq!(seed.energy, Some(8.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldSeed {
    pub energy: Option<f64>,
    pub coherence: Option<f64>,
    pub entropy: Option<f64>,
    pub temperature: Option<f64>,
    pub attractors: Vec<Attractor>,
    /// Merged over the default dimensions.
    pub dimensions: BTreeMap<String, Dimension>,
    pub session_id: Option<String>,
    pub tags: Vec<String>,
}

impl FieldSeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    #[must_use]
    pub fn coherence(mut self, coherence: f64) -> Self {
        self.coherence = Some(coherence);
        self
    }

    #[must_use]
    pub fn entropy(mut self, entropy: f64) -> Self {
        self.entropy = Some(entropy);
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn attractor(mut self, attractor: Attractor) -> Self {
        self.attractors.push(attractor);
        self
    }

    #[must_use]
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// State change reported by a step handler.
///
/// `None` fields are left untouched. `attractors` replaces the whole list,
/// `dimensions` are upserted, `tags` are appended (deduplicated).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDelta {
    pub energy: Option<f64>,
    pub coherence: Option<f64>,
    pub entropy: Option<f64>,
    pub temperature: Option<f64>,
    pub attractors: Option<Vec<Attractor>>,
    pub dimensions: BTreeMap<String, Dimension>,
    pub tags: Vec<String>,
}

impl FieldDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    #[must_use]
    pub fn coherence(mut self, coherence: f64) -> Self {
        self.coherence = Some(coherence);
        self
    }

    #[must_use]
    pub fn attractors(mut self, attractors: Vec<Attractor>) -> Self {
        self.attractors = Some(attractors);
        self
    }

    #[must_use]
    pub fn dimension(mut self, name: impl Into<String>, dimension: Dimension) -> Self {
        self.dimensions.insert(name.into(), dimension);
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// True when applying the delta would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy.is_none()
            && self.coherence.is_none()
            && self.entropy.is_none()
            && self.temperature.is_none()
            && self.attractors.is_none()
            && self.dimensions.is_empty()
            && self.tags.is_empty()
    }
}
