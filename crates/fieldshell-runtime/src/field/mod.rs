//! Fields: the mutable state that protocols and the scheduler act on.
//!
//! - [`Field`] and its parts ([`Attractor`], [`Dimension`], [`FieldMetadata`])
//! - [`FieldSeed`] / [`FieldDelta`]: partial inputs for create and mutate
//! - [`FieldStore`]: the live set, with per-field writer locks
//! - [`dynamics`]: the scheduler's evolution function and emergence score

pub mod dynamics;
mod error;
mod model;
mod store;

pub use error::FieldStoreError;
pub use model::{
    Attractor, AttractorType, Dimension, Field, FieldDelta, FieldMetadata, FieldSeed,
    DEFAULT_COHERENCE, DEFAULT_ENERGY, DEFAULT_ENTROPY, DEFAULT_TEMPERATURE, MAX_TEMPERATURE,
    MIN_TEMPERATURE,
};
pub use store::{FieldGuard, FieldStore};
