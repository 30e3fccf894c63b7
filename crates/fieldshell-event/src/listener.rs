//! Listener contract for the event bus.
//!
//! Listeners are identified by [`EventListener::id`]. Subscribing the
//! same id twice for the same kind is a no-op, as is unsubscribing an
//! id that was never subscribed.

use crate::{FieldEvent, ListenerError};

/// Receives field events synchronously from the event bus.
///
/// Implementations must be cheap: the bus calls listeners inline on the
/// publishing task, in registration order.
pub trait EventListener: Send + Sync {
    /// Stable identity used for idempotent subscribe/unsubscribe.
    fn id(&self) -> &str;

    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returned errors are logged by the bus and never reach the publisher.
    fn on_event(&self, event: &FieldEvent) -> Result<(), ListenerError>;
}

/// Closure-backed listener for simple cases.
///
/// # Example
///
/// ```
/// use fieldshell_event::{EventListener, FieldEvent, FieldEventKind, FnListener};
/// use fieldshell_types::FieldId;
/// use serde_json::Value;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// let listener = FnListener::new("counter", move |_event| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// let event = FieldEvent::new(FieldEventKind::FieldUpdated, FieldId::new(), Value::Null);
/// listener.on_event(&event).unwrap();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct FnListener<F>
where
    F: Fn(&FieldEvent) -> Result<(), ListenerError> + Send + Sync,
{
    id: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&FieldEvent) -> Result<(), ListenerError> + Send + Sync,
{
    /// Wraps a closure under the given listener id.
    pub fn new(id: impl Into<String>, handler: F) -> Self {
        Self {
            id: id.into(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&FieldEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn on_event(&self, event: &FieldEvent) -> Result<(), ListenerError> {
        (self.handler)(event)
    }
}
