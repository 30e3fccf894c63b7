//! EventBus - synchronous fan-out of field events.
//!
//! ```text
//!               publish(event)
//!                     │
//!                     ▼
//!   listeners[event.kind] (snapshot, registration order)
//!        │              │              │
//!        ▼              ▼              ▼
//!   ┌─────────┐    ┌─────────┐    ┌─────────┐
//!   │ ok      │    │ Err(..) │    │ panic   │
//!   └─────────┘    └─────────┘    └─────────┘
//!                   warn!, next   error!, next
//! ```
//!
//! The listener list is copied before delivery, so a listener may call
//! `subscribe` or `unsubscribe` on the bus without deadlocking. Changes
//! take effect from the next publish.

use fieldshell_event::{EventListener, FieldEvent, FieldEventKind};
use fieldshell_types::ErrorCode;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Routes [`FieldEvent`]s to the listeners registered for their kind.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<FieldEventKind, Vec<Arc<dyn EventListener>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind.
    ///
    /// Returns `false` if a listener with the same id is already
    /// registered for that kind.
    pub fn subscribe(&self, kind: FieldEventKind, listener: Arc<dyn EventListener>) -> bool {
        let mut listeners = self.listeners.write();
        let entry = listeners.entry(kind).or_default();
        if entry.iter().any(|l| l.id() == listener.id()) {
            return false;
        }
        entry.push(listener);
        true
    }

    /// Registers a listener for every event kind.
    ///
    /// Returns the number of kinds it was newly registered for.
    pub fn subscribe_all(&self, listener: Arc<dyn EventListener>) -> usize {
        FieldEventKind::ALL
            .iter()
            .filter(|&&kind| self.subscribe(kind, Arc::clone(&listener)))
            .count()
    }

    /// Removes the listener with `listener_id` from one kind.
    ///
    /// Returns `false` if it was not registered.
    pub fn unsubscribe(&self, kind: FieldEventKind, listener_id: &str) -> bool {
        let mut listeners = self.listeners.write();
        let Some(entry) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|l| l.id() != listener_id);
        entry.len() != before
    }

    /// Delivers `event` to its kind's listeners.
    ///
    /// Returns how many listeners handled it without error.
    pub fn publish(&self, event: &FieldEvent) -> usize {
        let targets: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();

        trace!(kind = %event.kind, field_id = %event.field_id, listeners = targets.len(), "Publishing event");

        let mut delivered = 0;
        for listener in targets {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(
                        listener = listener.id(),
                        kind = %event.kind,
                        code = e.code(),
                        error = %e,
                        "Event listener failed"
                    );
                }
                Err(_) => {
                    error!(listener = listener.id(), kind = %event.kind, "Event listener panicked");
                }
            }
        }
        delivered
    }

    /// Number of listeners registered for a kind.
    #[must_use]
    pub fn listener_count(&self, kind: FieldEventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldshell_event::{FnListener, ListenerError};
    use fieldshell_types::FieldId;
    use parking_lot::Mutex;
    use serde_json::Value;

    fn event(kind: FieldEventKind) -> FieldEvent {
        FieldEvent::new(kind, FieldId::new(), Value::Null)
    }

    fn recorder(id: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn EventListener> {
        let log = Arc::clone(log);
        let name = id.to_string();
        Arc::new(FnListener::new(id, move |_| {
            log.lock().push(name.clone());
            Ok(())
        }))
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(FieldEventKind::FieldUpdated, recorder("first", &log));
        bus.subscribe(FieldEventKind::FieldUpdated, recorder("second", &log));
        bus.subscribe(FieldEventKind::FieldCreated, recorder("other", &log));

        assert_eq!(bus.publish(&event(FieldEventKind::FieldUpdated)), 2);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn subscribe_is_idempotent() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        assert!(bus.subscribe(FieldEventKind::FieldCreated, recorder("a", &log)));
        assert!(!bus.subscribe(FieldEventKind::FieldCreated, recorder("a", &log)));
        assert_eq!(bus.listener_count(FieldEventKind::FieldCreated), 1);

        assert!(bus.unsubscribe(FieldEventKind::FieldCreated, "a"));
        assert!(!bus.unsubscribe(FieldEventKind::FieldCreated, "a"));
        assert!(!bus.unsubscribe(FieldEventKind::DimensionShift, "a"));
        assert_eq!(bus.publish(&event(FieldEventKind::FieldCreated)), 0);
    }

    #[test]
    fn failing_listeners_are_isolated() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let kind = FieldEventKind::EmergenceDetected;

        bus.subscribe(
            kind,
            Arc::new(FnListener::new("err", |_| {
                Err(ListenerError::Failed("disk full".into()))
            })),
        );
        bus.subscribe(
            kind,
            Arc::new(FnListener::new("boom", |_| panic!("listener bug"))),
        );
        bus.subscribe(kind, recorder("survivor", &log));

        assert_eq!(bus.publish(&event(kind)), 1);
        assert_eq!(*log.lock(), vec!["survivor"]);
    }

    #[test]
    fn subscribe_all_covers_every_kind() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        assert_eq!(bus.subscribe_all(recorder("all", &log)), FieldEventKind::ALL.len());

        for kind in FieldEventKind::ALL {
            bus.publish(&event(kind));
        }
        assert_eq!(log.lock().len(), FieldEventKind::ALL.len());

        bus.clear();
        assert_eq!(bus.listener_count(FieldEventKind::FieldCreated), 0);
    }

    #[test]
    fn listener_may_resubscribe_during_publish() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(
            FieldEventKind::AttractorFormed,
            Arc::new(FnListener::new("self-removing", move |e| {
                inner.unsubscribe(e.kind, "self-removing");
                Ok(())
            })),
        );

        assert_eq!(bus.publish(&event(FieldEventKind::AttractorFormed)), 1);
        assert_eq!(bus.listener_count(FieldEventKind::AttractorFormed), 0);
    }
}
