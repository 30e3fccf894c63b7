//! Engine Layer Errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EngineError::ProtocolNotFound`] | `ENGINE_PROTOCOL_NOT_FOUND` | No |
//! | [`EngineError::FieldNotFound`] | `ENGINE_FIELD_NOT_FOUND` | No |
//! | [`EngineError::InvalidInput`] | `ENGINE_INVALID_INPUT` | No |
//! | [`EngineError::StepFailed`] | `ENGINE_STEP_FAILED` | No |
//! | [`EngineError::ShuttingDown`] | `ENGINE_SHUTTING_DOWN` | No |
//!
//! The first three are input errors: the run fails before any field is
//! created or touched. `StepFailed` aborts a run part-way; steps that
//! already completed are not rolled back.

use crate::backend::BackendError;
use crate::schema::SchemaError;
use fieldshell_types::{ErrorCode, FieldId};
use thiserror::Error;

/// Protocol execution failure.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::engine::EngineError;
/// use fieldshell_types::ErrorCode;
///
/// let err = EngineError::ProtocolNotFound("missing".into());
/// assert_eq!(err.code(), "ENGINE_PROTOCOL_NOT_FOUND");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("protocol not found: {0}")]
    ProtocolNotFound(String),

    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    /// Parameters did not match the protocol's input schema.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SchemaError),

    /// A synchronous step raised.
    #[error("step {step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: BackendError,
    },

    #[error("engine is shutting down")]
    ShuttingDown,
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProtocolNotFound(_) => "ENGINE_PROTOCOL_NOT_FOUND",
            Self::FieldNotFound(_) => "ENGINE_FIELD_NOT_FOUND",
            Self::InvalidInput(_) => "ENGINE_INVALID_INPUT",
            Self::StepFailed { .. } => "ENGINE_STEP_FAILED",
            Self::ShuttingDown => "ENGINE_SHUTTING_DOWN",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
