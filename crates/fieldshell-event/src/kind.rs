//! Event kinds for type-based listener routing.
//!
//! Listeners subscribe per kind and only receive events of that kind.
//!
//! | Kind | Published by |
//! |------|--------------|
//! | `FieldCreated` | Engine (implicit field), runtime `create_field` |
//! | `FieldUpdated` | Engine after applying a step's state delta |
//! | `EmergenceDetected` | Scheduler tick, `emergence.detect_patterns` |
//! | `AttractorFormed` | `field.analyze_attractors` |
//! | `DimensionShift` | `field.activate_dimension` |
//! | `TranscendenceAchieved` | `beyond.*` when the level crosses threshold |

use serde::{Deserialize, Serialize};

/// Classification of a [`FieldEvent`](crate::FieldEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEventKind {
    /// A new field entered the store.
    FieldCreated,
    /// A step delta was applied to a field.
    FieldUpdated,
    /// A field's emergence score crossed the configured threshold.
    EmergenceDetected,
    /// Attractor analysis produced an attractor.
    AttractorFormed,
    /// A dimension was toggled or reweighted.
    DimensionShift,
    /// A transcendent synthesis reached the configured level.
    TranscendenceAchieved,
}

impl FieldEventKind {
    /// All kinds, in declaration order.
    pub const ALL: [FieldEventKind; 6] = [
        Self::FieldCreated,
        Self::FieldUpdated,
        Self::EmergenceDetected,
        Self::AttractorFormed,
        Self::DimensionShift,
        Self::TranscendenceAchieved,
    ];

    /// Returns the wire name (`snake_case`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FieldCreated => "field_created",
            Self::FieldUpdated => "field_updated",
            Self::EmergenceDetected => "emergence_detected",
            Self::AttractorFormed => "attractor_formed",
            Self::DimensionShift => "dimension_shift",
            Self::TranscendenceAchieved => "transcendence_achieved",
        }
    }

    /// Parses a wire name back into a kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for FieldEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
