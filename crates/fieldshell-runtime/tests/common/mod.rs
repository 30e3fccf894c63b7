//! Shared helpers for runtime integration tests.

#![allow(dead_code)]

use fieldshell_event::{FieldEvent, FieldEventKind, FnListener};
use fieldshell_runtime::{FieldRuntime, RuntimeConfig};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Config with the background scheduler off, so field state only
/// changes through protocol runs.
pub fn quiet_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.scheduler.enabled = false;
    config
}

/// Built and started runtime with no collaborators.
pub fn quiet_runtime() -> FieldRuntime {
    let runtime = FieldRuntime::builder(quiet_config())
        .with_seed(42)
        .build()
        .expect("default config is valid");
    runtime.start().expect("fresh runtime starts");
    runtime
}

pub fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be an object, got {other}"),
    }
}

/// Records every event of `kind` published on the runtime.
pub fn record(runtime: &FieldRuntime, kind: FieldEventKind) -> Arc<Mutex<Vec<FieldEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = format!("recorder-{}", kind.name());
    runtime
        .add_event_listener(
            kind,
            Arc::new(FnListener::new(id, move |event: &FieldEvent| {
                sink.lock().push(event.clone());
                Ok(())
            })),
        )
        .expect("runtime is running");
    seen
}
