//! Field events.
//!
//! A [`FieldEvent`] is write-once and fire-and-forget: the bus hands it
//! to listeners and forgets it. Nothing in the runtime persists events.

use crate::FieldEventKind;
use chrono::{DateTime, Utc};
use fieldshell_types::{EventId, FieldId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An observable change in a field.
///
/// # Example
///
/// ```
/// use fieldshell_event::{FieldEvent, FieldEventKind};
/// use fieldshell_types::FieldId;
/// use serde_json::json;
///
/// let event = FieldEvent::new(
///     FieldEventKind::EmergenceDetected,
///     FieldId::new(),
///     json!({"score": 0.91}),
/// )
/// .with_metadata("source", json!("scheduler"));
///
/// assert_eq!(event.kind, FieldEventKind::EmergenceDetected);
/// assert_eq!(event.metadata["source"], "scheduler");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEvent {
    /// Unique event id.
    pub id: EventId,
    /// Event kind, used for listener routing.
    #[serde(rename = "type")]
    pub kind: FieldEventKind,
    /// The field this event concerns.
    pub field_id: FieldId,
    /// Kind-specific payload.
    pub data: Value,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Free-form annotations (source, execution id, ...).
    pub metadata: Map<String, Value>,
}

impl FieldEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(kind: FieldEventKind, field_id: FieldId, data: Value) -> Self {
        Self {
            id: EventId::new(),
            kind,
            field_id,
            data,
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_key() {
        let field_id = FieldId::new();
        let event = FieldEvent::new(FieldEventKind::FieldCreated, field_id, json!({}));
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["type"], "field_created");
        assert!(value.get("fieldId").is_some());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn events_get_distinct_ids() {
        let field_id = FieldId::new();
        let a = FieldEvent::new(FieldEventKind::FieldUpdated, field_id, Value::Null);
        let b = FieldEvent::new(FieldEventKind::FieldUpdated, field_id, Value::Null);
        assert_ne!(a.id, b.id);
    }
}
