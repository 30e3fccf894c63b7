//! Field store errors.

use fieldshell_types::{ErrorCode, FieldId};
use thiserror::Error;

/// Field store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldStoreError {
    /// No live field with this id.
    #[error("field not found: {0}")]
    NotFound(FieldId),

    /// The field is locked by another writer.
    #[error("field busy: {0}")]
    Busy(FieldId),
}

impl ErrorCode for FieldStoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FIELD_NOT_FOUND",
            Self::Busy(_) => "FIELD_BUSY",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldshell_types::assert_error_codes;

    fn all_variants() -> Vec<FieldStoreError> {
        let id = FieldId::new();
        vec![FieldStoreError::NotFound(id), FieldStoreError::Busy(id)]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "FIELD_");
    }

    #[test]
    fn only_busy_is_recoverable() {
        let id = FieldId::new();
        assert!(!FieldStoreError::NotFound(id).is_recoverable());
        assert!(FieldStoreError::Busy(id).is_recoverable());
    }
}
