//! Context frame errors.

use fieldshell_types::{ErrorCode, FrameId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// Unknown or expired frame.
    #[error("frame not found: {0}")]
    NotFound(FrameId),

    /// A `[0, 1]` quantity was out of range.
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// A frame cannot relate to itself.
    #[error("frame {0} cannot relate to itself")]
    SelfRelation(FrameId),
}

impl ErrorCode for FrameError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FRAME_NOT_FOUND",
            Self::OutOfRange { .. } => "FRAME_OUT_OF_RANGE",
            Self::SelfRelation(_) => "FRAME_SELF_RELATION",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldshell_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        let id = FrameId::new();
        assert_error_codes(
            &[
                FrameError::NotFound(id),
                FrameError::OutOfRange {
                    name: "importance",
                    value: 2.0,
                },
                FrameError::SelfRelation(id),
            ],
            "FRAME_",
        );
    }
}
