//! Protocol shells and their registry.
//!
//! A [`ProtocolShell`] is data: typed inputs, an ordered list of
//! [`Step`]s and typed outputs. The [`ProtocolRegistry`] is a pure lookup
//! table; execution lives in [`crate::engine`].

pub mod builtin;
mod error;
mod registry;
mod shell;

pub use error::RegistryError;
pub use registry::ProtocolRegistry;
pub use shell::{
    Complexity, Condition, Namespace, Operator, ProtocolMetadata, ProtocolShell, Step,
};
