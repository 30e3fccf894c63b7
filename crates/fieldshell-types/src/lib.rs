//! Core types for fieldshell.
//!
//! This crate provides the identifier newtypes and the [`ErrorCode`]
//! contract shared by every layer of the fieldshell workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Contract Layer                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fieldshell-types   : ID types, ErrorCode  ◄── HERE          │
//! │  fieldshell-event   : FieldEvent, EventListener              │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Runtime Layer                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  fieldshell-runtime : schema, field, frame, protocol,        │
//! │                       backend, engine, FieldRuntime          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use fieldshell_types::{EventId, FieldId, FrameId, RequestId};
//!
//! let field = FieldId::new();
//! let frame = FrameId::new();
//! assert!(field.to_string().starts_with("field:"));
//! assert!(frame.to_string().starts_with("frame:"));
//!
//! // Correlation ids are unique per request
//! assert_ne!(RequestId::new(), RequestId::new());
//! assert_ne!(EventId::new(), EventId::new());
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{EventId, ExecutionId, FieldId, FrameId, RequestId};
