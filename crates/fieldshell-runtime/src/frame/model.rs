//! Context frame records.

use chrono::{DateTime, Utc};
use fieldshell_types::FrameId;
use serde::{Deserialize, Serialize};

/// A TTL-bounded memory record, independent of field state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFrame {
    pub id: FrameId,
    pub content: String,
    pub metadata: FrameMetadata,
    pub relations: Vec<FrameRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Creation time; expiry is measured from here.
    pub timestamp: DateTime<Utc>,
    /// In `[0, 1]`; search ranks by this.
    pub importance: f64,
    pub decay_rate: f64,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    pub source: String,
    pub confidence: f64,
}

/// Directed edge to another frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRelation {
    #[serde(rename = "targetFrameId")]
    pub target: FrameId,
    pub relation_type: String,
    pub strength: f64,
    pub bidirectional: bool,
}

/// Caller input for a new frame.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::frame::FrameDraft;
///
/// let draft = FrameDraft::new("coherence rose after stabilization")
///     .frame_type("observation")
///     .importance(0.7)
///     .source("operator");
/// assert_eq!(draft.frame_type, "observation");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameDraft {
    pub content: String,
    #[serde(rename = "type")]
    pub frame_type: String,
    pub importance: f64,
    pub decay_rate: f64,
    pub source: String,
    pub confidence: f64,
}

impl Default for FrameDraft {
    fn default() -> Self {
        Self {
            content: String::new(),
            frame_type: "context".into(),
            importance: 0.5,
            decay_rate: 0.1,
            source: "user".into(),
            confidence: 1.0,
        }
    }
}

impl FrameDraft {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn frame_type(mut self, frame_type: impl Into<String>) -> Self {
        self.frame_type = frame_type.into();
        self
    }

    #[must_use]
    pub fn importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    #[must_use]
    pub fn decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}
