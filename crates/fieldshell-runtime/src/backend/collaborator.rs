//! External collaborator contracts.
//!
//! Implementations live outside this crate (or in
//! [`ChannelCognitiveClient`](super::ChannelCognitiveClient)). The
//! dispatcher treats every error from these traits as a fallback trigger.

use super::CollaboratorError;
use crate::config::ComputeMode;
use crate::field::Field;
use async_trait::async_trait;
use fieldshell_types::RequestId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Request to the cognitive reasoning collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveRequest {
    pub id: RequestId,
    /// `"namespace.action"` of the originating step.
    pub operation: String,
    pub params: Map<String, Value>,
    pub field_snapshot: Field,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

impl CognitiveResponse {
    /// Successful response with default metadata.
    #[must_use]
    pub fn ok(result: Value, worker_id: impl Into<String>) -> Self {
        Self {
            success: true,
            result,
            patterns: Vec::new(),
            metadata: ResponseMetadata {
                worker_id: worker_id.into(),
                ..ResponseMetadata::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(rename = "processingTime")]
    pub processing_time_ms: u64,
    pub worker_id: String,
    pub memory_used: u64,
}

/// Reasoning backend for the `recursive` and `cognitive` namespaces.
#[async_trait]
pub trait CognitiveCollaborator: Send + Sync {
    async fn process(&self, request: CognitiveRequest)
        -> Result<CognitiveResponse, CollaboratorError>;
}

/// Request to the compute collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub compute_mode: ComputeMode,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    pub compute_mode: ComputeMode,
    #[serde(default)]
    pub performance_metrics: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Numeric backend for the `braun` namespace.
#[async_trait]
pub trait ComputeCollaborator: Send + Sync {
    async fn compute(&self, request: ComputeRequest) -> Result<ComputeResponse, CollaboratorError>;
}

/// Named-function backend for the `beyond` namespace.
#[async_trait]
pub trait TranscendentCollaborator: Send + Sync {
    /// Whether a function with this name is registered.
    fn has_function(&self, name: &str) -> bool;

    /// Calls a named function.
    async fn call(&self, name: &str, params: Value) -> Result<Value, CollaboratorError>;
}

type TranscendentFn = Arc<dyn Fn(Value) -> Result<Value, CollaboratorError> + Send + Sync>;

/// In-process [`TranscendentCollaborator`] backed by registered closures.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::backend::{FnTranscendent, TranscendentCollaborator};
/// use serde_json::json;
///
/// let functions = FnTranscendent::new()
///     .with_function("transcend_context", |_| Ok(json!({"transcendenceLevel": 0.9})));
/// assert!(functions.has_function("transcend_context"));
/// assert!(!functions.has_function("synthesize_knowledge"));
/// ```
#[derive(Default)]
pub struct FnTranscendent {
    functions: RwLock<HashMap<String, TranscendentFn>>,
}

impl FnTranscendent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CollaboratorError> + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    /// Registers (or replaces) a function.
    pub fn register<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Result<Value, CollaboratorError> + Send + Sync + 'static,
    {
        self.functions.write().insert(name.into(), Arc::new(f));
    }
}

#[async_trait]
impl TranscendentCollaborator for FnTranscendent {
    fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    async fn call(&self, name: &str, params: Value) -> Result<Value, CollaboratorError> {
        let function = self
            .functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CollaboratorError::MissingFunction(name.to_string()))?;
        function(params)
    }
}
