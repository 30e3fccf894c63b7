//! Unified error interface for fieldshell.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that
//! callers can branch on a stable, machine-readable code instead of
//! matching on message text.
//!
//! # Code Prefixes
//!
//! | Layer | Prefix |
//! |-------|--------|
//! | Schema validator | `SCHEMA_` |
//! | Field store | `FIELD_` |
//! | Context frames | `FRAME_` |
//! | Protocol registry | `REGISTRY_` |
//! | Backend dispatcher | `BACKEND_` |
//! | Execution engine | `ENGINE_` |
//! | Event listeners | `EVENT_` |
//! | Runtime facade | `RUNTIME_` |
//!
//! # Example
//!
//! ```
//! use fieldshell_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum StoreError {
//!     Missing,
//!     Busy,
//! }
//!
//! impl ErrorCode for StoreError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing => "STORE_MISSING",
//!             Self::Busy => "STORE_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = StoreError::Busy;
//! assert_eq!(err.code(), "STORE_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"ENGINE_PROTOCOL_NOT_FOUND"`
/// - **Layer-prefixed** (see the module table)
/// - **Stable**: codes are part of the public contract
///
/// # Recoverability
///
/// An error is recoverable when retrying, or waiting, may succeed:
/// collaborator timeouts and unavailability are recoverable, invalid
/// input and unknown identifiers are not.
pub trait ErrorCode {
    /// Returns the machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether a retry may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use fieldshell_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "BACKEND_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "BACKEND_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts [`assert_error_code`] for every error in the slice.
///
/// Pass one instance of every variant to cover the whole enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
