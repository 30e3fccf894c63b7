//! Backend dispatcher.
//!
//! Routes a step to its namespace handler:
//!
//! | Namespace | Backing | On collaborator failure |
//! |-----------|---------|-------------------------|
//! | `field` | local, deterministic | n/a |
//! | `recursive` | cognitive collaborator | fallback result |
//! | `cognitive` | cognitive collaborator | fallback result |
//! | `emergence` | local, over the execution context | n/a |
//! | `braun` | compute collaborator | `{success: false, ...}` |
//! | `beyond` | transcendent collaborator | fallback result |
//!
//! Fallback results carry `source: "fallback"` and
//! `workerId: "fallback"`, confidence in `[0.6, 0.9]`, and status
//! [`StepStatus::Fallback`]. They are normal outcomes: the dispatcher
//! only returns `Err` for unknown actions and malformed params.

use super::{
    field, BackendError, CognitiveCollaborator, CollaboratorError, ComputeCollaborator,
    StepAction, StepInput, StepResult, StepStatus, TranscendentCollaborator,
};
use crate::config::BackendsConfig;
use crate::frame::ContextFrameStore;
use crate::metrics::RuntimeMetrics;
use fieldshell_types::ErrorCode;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FALLBACK_SOURCE: &str = "fallback";

/// Routes steps to handlers and applies the fallback policy.
pub struct BackendDispatcher {
    pub(super) cognitive: Option<Arc<dyn CognitiveCollaborator>>,
    pub(super) compute: Option<Arc<dyn ComputeCollaborator>>,
    pub(super) transcendent: Option<Arc<dyn TranscendentCollaborator>>,
    pub(super) frames: Arc<ContextFrameStore>,
    pub(super) metrics: Arc<RuntimeMetrics>,
    pub(super) config: BackendsConfig,
}

impl BackendDispatcher {
    /// Creates a dispatcher with no collaborators attached.
    #[must_use]
    pub fn new(
        config: BackendsConfig,
        frames: Arc<ContextFrameStore>,
        metrics: Arc<RuntimeMetrics>,
    ) -> Self {
        Self {
            cognitive: None,
            compute: None,
            transcendent: None,
            frames,
            metrics,
            config,
        }
    }

    #[must_use]
    pub fn with_cognitive(mut self, collaborator: Arc<dyn CognitiveCollaborator>) -> Self {
        self.cognitive = Some(collaborator);
        self
    }

    #[must_use]
    pub fn with_compute(mut self, collaborator: Arc<dyn ComputeCollaborator>) -> Self {
        self.compute = Some(collaborator);
        self
    }

    #[must_use]
    pub fn with_transcendent(mut self, collaborator: Arc<dyn TranscendentCollaborator>) -> Self {
        self.transcendent = Some(collaborator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BackendsConfig {
        &self.config
    }

    /// Resolves and runs one step.
    ///
    /// # Errors
    ///
    /// [`BackendError::UnknownAction`] if the action is not in its
    /// namespace table, [`BackendError::InvalidParams`] for malformed params.
    pub async fn dispatch(&self, input: &StepInput) -> Result<StepResult, BackendError> {
        let action = StepAction::resolve(input.step.namespace, &input.step.action)?;
        debug!(
            execution_id = %input.execution_id,
            field_id = %input.field.id,
            step = %action,
            "Dispatching step"
        );

        match action {
            StepAction::Field(a) => field::handle(a, input),
            StepAction::Recursive(a) => self.recursive(a, input).await,
            StepAction::Cognitive(a) => self.cognitive(a, input).await,
            StepAction::Emergence(a) => self.emergence(a, input).await,
            StepAction::Braun(a) => self.braun(a, input).await,
            StepAction::Beyond(a) => self.beyond(a, input).await,
        }
    }

    /// Runs a collaborator call under the step timeout.
    pub(super) async fn call_with_timeout<T, F>(
        &self,
        collaborator: &str,
        input: &StepInput,
        call: F,
    ) -> Result<T, CollaboratorError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        let limit = input.timeout(self.config.step_timeout());
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout {
                collaborator: collaborator.to_string(),
                timeout_ms: millis(limit),
            }),
        }
    }

    /// Tags `data` as a fallback result and records the degradation.
    pub(super) fn fallback(
        &self,
        input: &StepInput,
        cause: &CollaboratorError,
        mut data: Map<String, Value>,
    ) -> StepResult {
        self.metrics.record_fallback();
        warn!(
            execution_id = %input.execution_id,
            step = %input.step.key(),
            code = cause.code(),
            error = %cause,
            "Collaborator unusable, using fallback"
        );
        data.insert("source".into(), Value::from(FALLBACK_SOURCE));
        data.insert("workerId".into(), Value::from(FALLBACK_SOURCE));
        StepResult::new(StepStatus::Fallback, data)
    }
}

pub(super) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::field::FieldSeed;
    use crate::protocol::Namespace;
    use fieldshell_types::ErrorCode;

    #[tokio::test]
    async fn unknown_action_is_an_error() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .dispatch(&input(Namespace::Emergence, "levitate", FieldSeed::new()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND_UNKNOWN_ACTION");
    }

    #[tokio::test(start_paused = true)]
    async fn call_with_timeout_reports_elapsed() {
        let dispatcher = dispatcher();
        let mut input = input(Namespace::Cognitive, "reason", FieldSeed::new());
        input.step.timeout_ms = Some(50);

        let err = dispatcher
            .call_with_timeout("cognitive", &input, async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, CollaboratorError>(())
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CollaboratorError::Timeout {
                collaborator: "cognitive".into(),
                timeout_ms: 50,
            }
        );
    }

    #[test]
    fn fallback_tags_and_counts() {
        let dispatcher = dispatcher();
        let input = input(Namespace::Recursive, "analyze", FieldSeed::new());
        let result = dispatcher.fallback(
            &input,
            &CollaboratorError::Unavailable("cognitive".into()),
            Map::new(),
        );

        assert!(result.is_fallback());
        assert_eq!(result.data["source"], "fallback");
        assert_eq!(result.data["workerId"], "fallback");
        assert_eq!(dispatcher.metrics.snapshot(0, 0).fallbacks, 1);
    }
}
