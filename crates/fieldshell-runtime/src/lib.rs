//! fieldshell runtime: protocol execution engine and field dynamics.
//!
//! A *protocol shell* is a declarative, multi-step procedure. The
//! runtime validates a caller's parameters against the shell, runs its
//! steps against a simulated *field* (energy, coherence, entropy,
//! attractors, dimensions), routes each step to a capability backend,
//! and evolves every field on a background timer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FieldRuntime                          │
//! │   start / shutdown · fields · protocols · frames · metrics   │
//! └──────────────────────────────────────────────────────────────┘
//!        │                    │                       │
//!        ▼                    ▼                       ▼
//! ┌──────────────┐   ┌─────────────────┐    ┌──────────────────┐
//! │ProtocolEngine│──►│BackendDispatcher│───►│  collaborators   │
//! │  + registry  │   │ field/emergence │    │ cognitive/compute│
//! │  + schema    │   │ local handlers  │    │ /transcendent    │
//! └──────┬───────┘   └─────────────────┘    └──────────────────┘
//!        │                    │ frames (insights)
//!        ▼                    ▼
//! ┌──────────────┐   ┌─────────────────┐    ┌──────────────────┐
//! │  FieldStore  │◄──│ FieldScheduler  │    │ContextFrameStore │
//! └──────┬───────┘   └────────┬────────┘    │  + TTL sweeper   │
//!        └────────┬───────────┘             └──────────────────┘
//!                 ▼
//!          ┌────────────┐
//!          │  EventBus  │──► listeners
//!          └────────────┘
//! ```
//!
//! # Modules
//!
//! - [`schema`]: type-schema validation of protocol inputs
//! - [`field`]: field model, store and dynamics
//! - [`frame`]: TTL-bounded context memory
//! - [`protocol`]: shell definitions, registry, built-in shells
//! - [`backend`]: step dispatch, collaborator traits, fallbacks
//! - [`engine`]: execution engine, scheduler, event bus
//! - [`config`]: layered configuration
//! - [`metrics`]: runtime counters
//!
//! Logging goes through `tracing`; this crate never installs a subscriber.

pub mod backend;
pub mod config;
pub mod engine;
pub mod field;
pub mod frame;
pub mod metrics;
pub mod protocol;
mod runtime;
pub mod schema;

pub use backend::{
    BackendDispatcher, BackendError, ChannelCognitiveClient, CognitiveCollaborator,
    CollaboratorError, ComputeCollaborator, FnTranscendent, StepResult, StepStatus,
    TranscendentCollaborator,
};
pub use config::{
    default_config_dir, default_config_path, ConfigError, ConfigLayer, ConfigLoader, ConfigResolver,
    NoOpResolver, RuntimeConfig,
};
pub use engine::{EngineError, EventBus, ExecutionOutcome, FieldScheduler, ProtocolEngine};
pub use field::{Field, FieldDelta, FieldSeed, FieldStore, FieldStoreError};
pub use frame::{ContextFrame, ContextFrameStore, FrameDraft, FrameError};
pub use metrics::{MetricsSnapshot, RuntimeMetrics};
pub use protocol::{ProtocolRegistry, ProtocolShell, RegistryError};
pub use runtime::{FieldRuntime, FieldRuntimeBuilder, RuntimeError};
pub use schema::SchemaError;
