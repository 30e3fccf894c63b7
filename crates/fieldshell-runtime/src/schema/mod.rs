//! Schema validation for protocol inputs.
//!
//! A protocol shell declares its inputs and outputs as a [`SchemaMap`]
//! (name → [`TypeSchema`]). The engine runs [`validate_params`] before
//! touching any field; a failure aborts the run with no side effects.

mod error;
mod types;
mod validator;

pub use error::SchemaError;
pub use types::{SchemaKind, SchemaMap, TypeSchema};
pub use validator::{validate, validate_params, value_kind};
