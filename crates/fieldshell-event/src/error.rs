//! Listener errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ListenerError::Rejected`] | `EVENT_LISTENER_REJECTED` | No |
//! | [`ListenerError::Failed`] | `EVENT_LISTENER_FAILED` | Yes |
//!
//! The event bus never propagates a listener error: it logs it and
//! moves on to the next listener.

use fieldshell_types::ErrorCode;
use thiserror::Error;

/// Error returned by an [`EventListener`](crate::EventListener).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// The listener refuses this event (bad payload, wrong field).
    #[error("listener rejected event: {0}")]
    Rejected(String),

    /// The listener failed while handling the event.
    #[error("listener failed: {0}")]
    Failed(String),
}

impl ErrorCode for ListenerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "EVENT_LISTENER_REJECTED",
            Self::Failed(_) => "EVENT_LISTENER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldshell_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(
            &[
                ListenerError::Rejected("x".into()),
                ListenerError::Failed("x".into()),
            ],
            "EVENT_",
        );
    }

    #[test]
    fn display_contains_reason() {
        let err = ListenerError::Failed("sink closed".into());
        assert!(err.to_string().contains("sink closed"));
        assert!(err.is_recoverable());
    }
}
