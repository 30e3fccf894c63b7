//! Context frames: short-lived memory records ranked by importance.

mod error;
mod model;
mod store;

pub use error::FrameError;
pub use model::{ContextFrame, FrameDraft, FrameMetadata, FrameRelation};
pub use store::{spawn_sweeper, ContextFrameStore};
