//! `braun` namespace: numeric work on the compute collaborator.
//!
//! Failures never raise and never fall back to a local computation.
//! The step records `{success: false, error, computeMode,
//! performanceMetrics}` with status [`StepStatus::Failed`], and callers
//! inspect `success`.

use super::dispatcher::BackendDispatcher;
use super::step::object;
use super::{
    BackendError, BraunAction, CollaboratorError, ComputeRequest, StepInput, StepResult,
    StepStatus,
};
use crate::config::ComputeMode;
use fieldshell_types::ErrorCode;
use serde_json::{json, Map, Value};
use tracing::warn;

const COLLABORATOR: &str = "compute";

impl BackendDispatcher {
    pub(super) async fn braun(
        &self,
        action: BraunAction,
        input: &StepInput,
    ) -> Result<StepResult, BackendError> {
        let mode = match input.text("computeMode")? {
            Some(text) => text.parse::<ComputeMode>().map_err(|e| input.invalid(e))?,
            None => self.config.compute_mode,
        };
        let request = ComputeRequest {
            task: input.text("task")?.unwrap_or(action.name()).to_string(),
            code: input.text("code")?.map(str::to_string),
            compute_mode: mode,
            params: input.merged_params(),
        };

        let outcome = match self.compute.as_ref() {
            Some(collaborator) => {
                self.call_with_timeout(COLLABORATOR, input, collaborator.compute(request))
                    .await
            }
            None => Err(CollaboratorError::Unavailable(COLLABORATOR.into())),
        };

        Ok(match outcome {
            Ok(response) if response.success => StepResult::success(object(json!({
                "success": true,
                "result": response.result,
                "computeMode": response.compute_mode,
                "performanceMetrics": response.performance_metrics,
            }))),
            Ok(response) => {
                let cause = CollaboratorError::Failed(
                    response
                        .error
                        .unwrap_or_else(|| "compute reported success: false".into()),
                );
                self.compute_failure(input, &cause, response.compute_mode, response.performance_metrics)
            }
            Err(cause) => self.compute_failure(input, &cause, mode, Map::new()),
        })
    }

    fn compute_failure(
        &self,
        input: &StepInput,
        cause: &CollaboratorError,
        mode: ComputeMode,
        performance_metrics: Map<String, Value>,
    ) -> StepResult {
        self.metrics.record_fallback();
        warn!(
            execution_id = %input.execution_id,
            step = %input.step.key(),
            code = cause.code(),
            error = %cause,
            "Compute collaborator failed"
        );
        StepResult::new(
            StepStatus::Failed,
            object(json!({
                "success": false,
                "error": cause.to_string(),
                "computeMode": mode,
                "performanceMetrics": performance_metrics,
            })),
        )
    }
}
