//! Event contracts for fieldshell.
//!
//! This crate defines what flows over the runtime's event bus: the
//! [`FieldEvent`] record, its [`FieldEventKind`], and the
//! [`EventListener`] trait that subscribers implement.
//!
//! # Flow
//!
//! ```text
//! Scheduler tick ──┐
//! Step handlers ───┼──► EventBus::publish(FieldEvent)
//! Engine ──────────┘            │
//!                               ▼ (listeners for event.kind, in order)
//!                     ┌──────────────────┐
//!                     │ EventListener #1 │  error/panic → logged, skipped
//!                     │ EventListener #2 │
//!                     └──────────────────┘
//! ```
//!
//! Publishing is synchronous and fire-and-forget. A failing listener
//! never stops the remaining listeners and never reaches the publisher.

mod error;
mod event;
mod kind;
mod listener;

pub use error::ListenerError;
pub use event::FieldEvent;
pub use kind::FieldEventKind;
pub use listener::{EventListener, FnListener};
