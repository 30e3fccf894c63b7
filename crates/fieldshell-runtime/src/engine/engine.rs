//! Protocol execution engine.
//!
//! # Run lifecycle
//!
//! ```text
//! Validating ──► FieldResolved ──► Running(step) ──► Formatting ──► Completed
//!     │               │                 │
//!     └───────────────┴─────────────────┴──────────────────────────► Failed
//! ```
//!
//! - Validating: parameters are checked against the shell's input schema.
//!   Nothing is created on failure.
//! - FieldResolved: an explicit field id must exist; otherwise a fresh
//!   field is created.
//! - Running: steps run in declaration order. A step whose conditions do
//!   not all hold is skipped and leaves no result. A sync step runs under
//!   the field's writer lock, so its dispatch, delta application and
//!   version bump cannot interleave with another writer. An async step
//!   records `{status: "async_started"}` and runs detached.
//! - Formatting: each output-schema key takes the first step result (in
//!   execution order) that has a property of that name.

use super::condition;
use super::{EngineError, EventBus, TaskSupervisor};
use crate::backend::{BackendDispatcher, BackendError, StepInput, StepResult};
use crate::field::{FieldSeed, FieldStore};
use crate::metrics::RuntimeMetrics;
use crate::protocol::{ProtocolRegistry, Step};
use crate::schema::{validate_params, SchemaMap};
use fieldshell_event::{FieldEvent, FieldEventKind};
use fieldshell_types::{ErrorCode, ExecutionId, FieldId};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub execution_id: ExecutionId,
    pub protocol: String,
    pub field_id: FieldId,
    /// Formatted against the shell's output schema.
    pub output: Map<String, Value>,
    /// Raw step results keyed `"namespace.action"`, in execution order.
    pub results: Map<String, Value>,
    /// Keys of steps whose conditions did not hold.
    pub skipped: Vec<String>,
}

/// Shared by the run loop and detached async steps.
struct StepRunner {
    store: Arc<FieldStore>,
    dispatcher: Arc<BackendDispatcher>,
    bus: Arc<EventBus>,
    metrics: Arc<RuntimeMetrics>,
}

impl StepRunner {
    /// Dispatches one step and applies its outcome under the field lock.
    async fn run(
        &self,
        execution_id: ExecutionId,
        step: Step,
        field_id: FieldId,
        params: Map<String, Value>,
        results: Map<String, Value>,
    ) -> Result<StepResult, BackendError> {
        let guard = self
            .store
            .lock(field_id)
            .await
            .map_err(|_| BackendError::FieldNotFound(field_id))?;

        let key = step.key();
        let input = StepInput {
            execution_id,
            step,
            field: guard.snapshot(),
            params,
            results,
        };
        let result = self.dispatcher.dispatch(&input).await?;

        let field = guard.mutate(|f| {
            if let Some(delta) = &result.delta {
                f.apply(delta);
            }
        });
        drop(guard);
        self.metrics.record_step_executed();

        for (kind, data) in &result.events {
            self.publish(*kind, field_id, data.clone(), execution_id, &key);
        }
        if result.delta.is_some() {
            self.publish(
                FieldEventKind::FieldUpdated,
                field_id,
                json!({"step": key, "version": field.metadata.version, "metrics": field.metrics()}),
                execution_id,
                &key,
            );
        }
        Ok(result)
    }

    fn publish(
        &self,
        kind: FieldEventKind,
        field_id: FieldId,
        data: Value,
        execution_id: ExecutionId,
        step: &str,
    ) {
        if kind == FieldEventKind::EmergenceDetected {
            self.metrics.record_emergence_event();
        }
        let event = FieldEvent::new(kind, field_id, data)
            .with_metadata("executionId", json!(execution_id.to_string()))
            .with_metadata("step", json!(step));
        self.bus.publish(&event);
    }
}

/// Runs protocol shells against fields.
pub struct ProtocolEngine {
    registry: Arc<ProtocolRegistry>,
    runner: Arc<StepRunner>,
    supervisor: TaskSupervisor,
    closed: AtomicBool,
}

impl ProtocolEngine {
    #[must_use]
    pub fn new(
        registry: Arc<ProtocolRegistry>,
        store: Arc<FieldStore>,
        dispatcher: Arc<BackendDispatcher>,
        bus: Arc<EventBus>,
        metrics: Arc<RuntimeMetrics>,
    ) -> Self {
        Self {
            registry,
            runner: Arc::new(StepRunner {
                store,
                dispatcher,
                bus,
                metrics,
            }),
            supervisor: TaskSupervisor::new(),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ProtocolRegistry> {
        &self.registry
    }

    /// Creates a field and announces it with `field_created`.
    pub fn create_field(&self, seed: FieldSeed) -> FieldId {
        let runner = &self.runner;
        let id = runner.store.create(seed);
        runner.metrics.record_field_created();
        let metrics = runner.store.get(id).map_or(Value::Null, |f| f.metrics());
        runner
            .bus
            .publish(&FieldEvent::new(FieldEventKind::FieldCreated, id, metrics));
        id
    }

    /// Executes a registered protocol.
    ///
    /// With `field_id = None` a new field is created for the run.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ProtocolNotFound`] / [`EngineError::InvalidInput`] /
    ///   [`EngineError::FieldNotFound`] before any step runs
    /// - [`EngineError::StepFailed`] when a synchronous step raises
    /// - [`EngineError::ShuttingDown`] after [`close`](Self::close)
    pub async fn execute(
        &self,
        name: &str,
        params: Map<String, Value>,
        field_id: Option<FieldId>,
    ) -> Result<ExecutionOutcome, EngineError> {
        if self.is_closed() {
            return Err(EngineError::ShuttingDown);
        }
        let shell = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::ProtocolNotFound(name.to_string()))?;

        // undeclared params pass through unchecked
        let validated = validate_params(&params, &shell.input_schema)?;
        let mut params = params;
        params.extend(validated);

        let field_id = match field_id {
            Some(id) if self.runner.store.contains(id) => id,
            Some(id) => return Err(EngineError::FieldNotFound(id)),
            None => self.create_field(FieldSeed::new()),
        };

        let execution_id = ExecutionId::new();
        debug!(
            execution_id = %execution_id,
            protocol = name,
            field_id = %field_id,
            steps = shell.process.len(),
            "Protocol started"
        );

        let mut results = Map::new();
        let mut skipped = Vec::new();
        for step in &shell.process {
            let key = step.key();
            let context = self.context_view(field_id, &params, &results);
            if !condition::evaluate_all(&step.conditions, &context) {
                debug!(execution_id = %execution_id, step = %key, "Step skipped");
                self.runner.metrics.record_step_skipped();
                skipped.push(key);
                continue;
            }

            if step.async_mode {
                results.insert(key, StepResult::async_started().to_value());
                self.spawn_async(execution_id, step.clone(), field_id, params.clone(), results.clone());
                continue;
            }

            match self
                .runner
                .run(execution_id, step.clone(), field_id, params.clone(), results.clone())
                .await
            {
                Ok(result) => {
                    results.insert(key, result.to_value());
                }
                Err(source) => {
                    self.runner.metrics.record_protocol_failed();
                    warn!(
                        execution_id = %execution_id,
                        protocol = name,
                        step = %key,
                        code = source.code(),
                        error = %source,
                        "Protocol failed"
                    );
                    return Err(EngineError::StepFailed { step: key, source });
                }
            }
        }

        let output = format_output(&shell.output_schema, &results);
        self.runner.metrics.record_protocol_executed();
        info!(
            execution_id = %execution_id,
            protocol = name,
            field_id = %field_id,
            executed = results.len(),
            skipped = skipped.len(),
            "Protocol completed"
        );

        Ok(ExecutionOutcome {
            execution_id,
            protocol: name.to_string(),
            field_id,
            output,
            results,
            skipped,
        })
    }

    /// Async steps still running.
    #[must_use]
    pub fn pending_async_steps(&self) -> usize {
        self.supervisor.len()
    }

    /// Refuses new runs and cancels outstanding async steps.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.supervisor.abort_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn spawn_async(
        &self,
        execution_id: ExecutionId,
        step: Step,
        field_id: FieldId,
        params: Map<String, Value>,
        results: Map<String, Value>,
    ) {
        let runner = Arc::clone(&self.runner);
        runner.metrics.record_async_step_started();
        self.supervisor.spawn(async move {
            let key = step.key();
            if let Err(e) = runner.run(execution_id, step, field_id, params, results).await {
                runner.metrics.record_async_step_failed();
                warn!(
                    execution_id = %execution_id,
                    step = %key,
                    code = e.code(),
                    error = %e,
                    "Async step failed"
                );
            }
        });
    }

    /// `{field, params, results}` as conditions see it.
    fn context_view(
        &self,
        field_id: FieldId,
        params: &Map<String, Value>,
        results: &Map<String, Value>,
    ) -> Value {
        let field = self
            .runner
            .store
            .get(field_id)
            .and_then(|f| serde_json::to_value(f).ok())
            .unwrap_or(Value::Null);
        json!({
            "field": field,
            "params": params,
            "results": results,
        })
    }
}

/// First-match mapping of output keys onto step results.
#[must_use]
pub fn format_output(schema: &SchemaMap, results: &Map<String, Value>) -> Map<String, Value> {
    let mut output = Map::new();
    for key in schema.keys() {
        let found = results
            .values()
            .find_map(|result| result.as_object().and_then(|r| r.get(key)));
        if let Some(value) = found {
            output.insert(key.clone(), value.clone());
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendsConfig;
    use crate::frame::ContextFrameStore;
    use crate::protocol::{Condition, Namespace, Operator, ProtocolShell};
    use crate::schema::TypeSchema;
    use fieldshell_event::FnListener;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Harness {
        engine: ProtocolEngine,
        store: Arc<FieldStore>,
        bus: Arc<EventBus>,
        metrics: Arc<RuntimeMetrics>,
    }

    fn harness() -> Harness {
        let store = Arc::new(FieldStore::new());
        let bus = Arc::new(EventBus::new());
        let metrics = Arc::new(RuntimeMetrics::new());
        let frames = Arc::new(ContextFrameStore::new(
            Duration::from_secs(60),
            Arc::clone(&metrics),
        ));
        let dispatcher = Arc::new(BackendDispatcher::new(
            BackendsConfig::default(),
            frames,
            Arc::clone(&metrics),
        ));
        let engine = ProtocolEngine::new(
            Arc::new(ProtocolRegistry::with_builtins()),
            Arc::clone(&store),
            dispatcher,
            Arc::clone(&bus),
            Arc::clone(&metrics),
        );
        Harness {
            engine,
            store,
            bus,
            metrics,
        }
    }

    fn record_kinds(bus: &EventBus) -> Arc<Mutex<Vec<FieldEventKind>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        bus.subscribe_all(Arc::new(FnListener::new("log", move |e: &FieldEvent| {
            log.lock().push(e.kind);
            Ok(())
        })));
        seen
    }

    #[tokio::test]
    async fn unknown_protocol_touches_nothing() {
        let h = harness();
        let err = h
            .engine
            .execute("nope", Map::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ProtocolNotFound(ref n) if n == "nope"));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn invalid_input_touches_nothing() {
        let h = harness();
        let err = h
            .engine
            .execute("recursive_analysis", Map::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENGINE_INVALID_INPUT");
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn unknown_field_id_fails_fast() {
        let h = harness();
        let missing = FieldId::new();
        let err = h
            .engine
            .execute("field_initialization", Map::new(), Some(missing))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::FieldNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn sync_steps_bump_version_and_publish() {
        let h = harness();
        let seen = record_kinds(&h.bus);
        let params = serde_json::from_value(json!({"energy": 10.0, "coherence": 0.9})).unwrap();

        let outcome = h
            .engine
            .execute("field_initialization", params, None)
            .await
            .unwrap();

        assert_eq!(outcome.output["energy"], 10.0);
        assert_eq!(outcome.output["coherence"], 0.9);
        assert_eq!(outcome.output["attractors"].as_array().unwrap().len(), 1);

        let field = h.store.get(outcome.field_id).unwrap();
        assert_eq!(field.metadata.version, 3);
        assert_eq!(field.attractors.len(), 1);

        let kinds = seen.lock().clone();
        assert_eq!(kinds[0], FieldEventKind::FieldCreated);
        assert!(kinds.contains(&FieldEventKind::AttractorFormed));
        assert_eq!(
            kinds.iter().filter(|k| **k == FieldEventKind::FieldUpdated).count(),
            2
        );
        assert_eq!(h.metrics.snapshot(0, 0).protocols_executed, 1);
    }

    #[tokio::test]
    async fn false_conditions_skip_steps() {
        let h = harness();
        let shell = ProtocolShell::new("guarded", "never runs")
            .step(
                Step::new(Namespace::Field, "maximize_coherence").when(Condition::new(
                    "field.energy",
                    Operator::Greater,
                    json!(100),
                )),
            )
            .output("coherence", TypeSchema::number());
        h.engine.registry().register(shell).unwrap();
        let id = h.engine.create_field(FieldSeed::new());

        let outcome = h.engine.execute("guarded", Map::new(), Some(id)).await.unwrap();

        assert!(outcome.output.is_empty());
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.skipped, vec!["field.maximize_coherence".to_string()]);
        assert_eq!(h.store.get(id).unwrap().metadata.version, 1);
    }

    #[tokio::test]
    async fn failing_sync_step_aborts_run() {
        let h = harness();
        let shell = ProtocolShell::new("broken", "missing param")
            .step(Step::new(Namespace::Field, "activate_dimension"))
            .step(Step::new(Namespace::Field, "maximize_coherence"));
        h.engine.registry().register(shell).unwrap();
        let id = h.engine.create_field(FieldSeed::new());

        let err = h.engine.execute("broken", Map::new(), Some(id)).await.unwrap_err();
        assert!(matches!(err, EngineError::StepFailed { ref step, .. } if step == "field.activate_dimension"));
        // second step never ran
        let field = h.store.get(id).unwrap();
        assert!((field.coherence - 0.5).abs() < f64::EPSILON);
        assert_eq!(h.metrics.snapshot(0, 0).protocols_failed, 1);
    }

    #[tokio::test]
    async fn async_step_records_placeholder_and_applies_later() {
        let h = harness();
        let shell = ProtocolShell::new("detached", "background maximize")
            .step(Step::new(Namespace::Field, "maximize_coherence").detached())
            .output("status", TypeSchema::string());
        h.engine.registry().register(shell).unwrap();
        let id = h.engine.create_field(FieldSeed::new());

        let outcome = h.engine.execute("detached", Map::new(), Some(id)).await.unwrap();
        assert_eq!(
            outcome.results["field.maximize_coherence"],
            json!({"status": "async_started"})
        );
        assert_eq!(outcome.output["status"], "async_started");

        for _ in 0..100 {
            if h.engine.pending_async_steps() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let field = h.store.get(id).unwrap();
        assert!((field.coherence - 0.95).abs() < 1e-12);
        assert_eq!(h.metrics.snapshot(0, 0).async_steps_started, 1);
    }

    #[tokio::test]
    async fn async_step_failure_is_only_counted() {
        let h = harness();
        let shell = ProtocolShell::new("detached_bad", "bad background step")
            .step(Step::new(Namespace::Field, "activate_dimension").detached());
        h.engine.registry().register(shell).unwrap();

        let outcome = h.engine.execute("detached_bad", Map::new(), None).await;
        assert!(outcome.is_ok());

        for _ in 0..100 {
            if h.metrics.snapshot(0, 0).async_steps_failed == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(h.metrics.snapshot(0, 0).async_steps_failed, 1);
    }

    #[tokio::test]
    async fn closed_engine_refuses_runs() {
        let h = harness();
        h.engine.close();
        let err = h
            .engine
            .execute("field_initialization", Map::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShuttingDown));
    }

    #[test]
    fn output_takes_first_match_in_execution_order() {
        let mut schema = SchemaMap::new();
        schema.insert("confidence".into(), TypeSchema::number());
        schema.insert("absent".into(), TypeSchema::number());
        let results: Map<String, Value> = serde_json::from_value(json!({
            "recursive.analyze": {"status": "fallback", "confidence": 0.7},
            "recursive.refine": {"status": "fallback", "confidence": 0.8}
        }))
        .unwrap();

        let output = format_output(&schema, &results);
        assert_eq!(output["confidence"], 0.7);
        assert!(!output.contains_key("absent"));
    }
}
