//! Protocol engine, scheduler and event bus.
//!
//! ```text
//!   execute(name, params)           interval tick
//!          │                              │
//!          ▼                              ▼
//!   ┌───────────────┐              ┌──────────────┐
//!   │ProtocolEngine │              │FieldScheduler│
//!   │  conditions   │              │ evolve/score │
//!   │  sync / async │              └──────┬───────┘
//!   └──────┬────────┘                     │ try_lock
//!          │ lock                         │
//!          ▼                              ▼
//!   ┌────────────────────────────────────────────┐
//!   │        FieldStore (per-field writer)       │
//!   └────────────────────────────────────────────┘
//!          │ deltas and events                │ emergence
//!          ▼                                  ▼
//!   ┌────────────────────────────────────────────┐
//!   │                  EventBus                  │
//!   └────────────────────────────────────────────┘
//! ```
//!
//! # Main Types
//!
//! - [`ProtocolEngine`]: runs protocol shells against fields
//! - [`FieldScheduler`]: background field evolution
//! - [`EventBus`]: synchronous listener fan-out
//! - [`EngineError`]: run failures (implements [`ErrorCode`])
//!
//! [`ErrorCode`]: fieldshell_types::ErrorCode

pub mod condition;
#[allow(clippy::module_inception)]
mod engine;
mod error;
mod eventbus;
mod scheduler;
mod supervisor;

pub use engine::{format_output, ExecutionOutcome, ProtocolEngine};
pub use error::EngineError;
pub use eventbus::EventBus;
pub use scheduler::{FieldScheduler, TickReport};
pub use supervisor::TaskSupervisor;
