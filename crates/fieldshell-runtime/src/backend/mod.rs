//! Step backends.
//!
//! The engine hands each step to [`BackendDispatcher::dispatch`] as a
//! [`StepInput`] and receives a [`StepResult`]. Handlers never mutate
//! the field store or publish events themselves; they return a
//! [`FieldDelta`](crate::field::FieldDelta) and a list of events, and the
//! engine applies both under the field's writer lock.
//!
//! External work goes through three collaborator traits:
//!
//! - [`CognitiveCollaborator`]: `recursive` and `cognitive` namespaces
//! - [`ComputeCollaborator`]: `braun` namespace
//! - [`TranscendentCollaborator`]: `beyond` namespace
//!
//! [`ChannelCognitiveClient`] and [`FnTranscendent`] are in-process
//! implementations.

mod action;
mod beyond;
mod braun;
mod channel;
mod cognitive;
mod collaborator;
mod dispatcher;
mod emergence;
mod error;
mod field;
mod step;

pub use action::{
    BeyondAction, BraunAction, CognitiveAction, EmergenceAction, FieldAction, RecursiveAction,
    StepAction,
};
pub use channel::{ChannelCognitiveClient, CognitiveReply, CognitiveWorker};
pub use cognitive::field_labels;
pub use collaborator::{
    CognitiveCollaborator, CognitiveRequest, CognitiveResponse, ComputeCollaborator,
    ComputeRequest, ComputeResponse, FnTranscendent, ResponseMetadata, TranscendentCollaborator,
};
pub use dispatcher::{BackendDispatcher, FALLBACK_SOURCE};
pub use emergence::is_emergent;
pub use error::{BackendError, CollaboratorError};
pub use field::derive_attractors;
pub use step::{StepInput, StepResult, StepStatus};
