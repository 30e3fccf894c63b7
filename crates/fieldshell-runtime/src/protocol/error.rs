//! Protocol registry errors.

use fieldshell_types::ErrorCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A shell with this name is already registered.
    #[error("protocol already registered: {0}")]
    Duplicate(String),

    /// `metadata.name` is empty.
    #[error("protocol name must not be empty")]
    EmptyName,

    /// Reliability outside `[0, 1]`.
    #[error("protocol {name}: reliability {value} is outside [0, 1]")]
    InvalidReliability { name: String, value: String },
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "REGISTRY_DUPLICATE",
            Self::EmptyName => "REGISTRY_EMPTY_NAME",
            Self::InvalidReliability { .. } => "REGISTRY_INVALID_RELIABILITY",
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
        assert_error_codes(
            &[
                RegistryError::Duplicate("x".into()),
                RegistryError::EmptyName,
                RegistryError::InvalidReliability {
                    name: "x".into(),
                    value: "1.2".into(),
                },
            ],
            "REGISTRY_",
        );
    }
}
