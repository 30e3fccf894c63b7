//! Backend errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`BackendError::UnknownAction`] | `BACKEND_UNKNOWN_ACTION` | No |
//! | [`BackendError::InvalidParams`] | `BACKEND_INVALID_PARAMS` | No |
//! | [`BackendError::FieldNotFound`] | `BACKEND_FIELD_NOT_FOUND` | No |
//! | [`BackendError::Collaborator`] | inner code | Yes |
//! | [`CollaboratorError::Unavailable`] | `BACKEND_COLLABORATOR_UNAVAILABLE` | Yes |
//! | [`CollaboratorError::Timeout`] | `BACKEND_COLLABORATOR_TIMEOUT` | Yes |
//! | [`CollaboratorError::Failed`] | `BACKEND_COLLABORATOR_FAILED` | Yes |
//! | [`CollaboratorError::MissingFunction`] | `BACKEND_MISSING_FUNCTION` | Yes |
//!
//! Built-in handlers never return [`BackendError::Collaborator`]: a
//! collaborator failure always turns into a fallback result.

use crate::protocol::Namespace;
use fieldshell_types::{ErrorCode, FieldId};
use thiserror::Error;

/// A synchronous step failure. Aborts the owning run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("unknown action '{action}' in namespace '{namespace}'")]
    UnknownAction { namespace: Namespace, action: String },

    #[error("invalid params for {step}: {message}")]
    InvalidParams { step: String, message: String },

    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl BackendError {
    pub fn invalid_params(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for BackendError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "BACKEND_UNKNOWN_ACTION",
            Self::InvalidParams { .. } => "BACKEND_INVALID_PARAMS",
            Self::FieldNotFound(_) => "BACKEND_FIELD_NOT_FOUND",
            Self::Collaborator(e) => e.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }
}

/// An external collaborator could not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// No collaborator is attached, or its channel is closed.
    #[error("{0} collaborator unavailable")]
    Unavailable(String),

    #[error("{collaborator} collaborator timed out after {timeout_ms}ms")]
    Timeout {
        collaborator: String,
        timeout_ms: u64,
    },

    /// The collaborator answered with an error or `success: false`.
    #[error("collaborator failed: {0}")]
    Failed(String),

    /// The transcendent collaborator has no function with this name.
    #[error("no collaborator function named '{0}'")]
    MissingFunction(String),
}

impl ErrorCode for CollaboratorError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "BACKEND_COLLABORATOR_UNAVAILABLE",
            Self::Timeout { .. } => "BACKEND_COLLABORATOR_TIMEOUT",
            Self::Failed(_) => "BACKEND_COLLABORATOR_FAILED",
            Self::MissingFunction(_) => "BACKEND_MISSING_FUNCTION",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
