//! The embeddable runtime facade.
//!
//! [`FieldRuntime`] owns every store and background task. Build it with
//! [`FieldRuntime::builder`], call [`start`](FieldRuntime::start) inside a
//! Tokio runtime, and [`shutdown`](FieldRuntime::shutdown) when done.
//!
//! # Example
//!
//! ```
//! use fieldshell_runtime::{FieldRuntime, RuntimeConfig};
//! use serde_json::{json, Map};
//!
//! # tokio_test_block_on(async {
//! let runtime = FieldRuntime::builder(RuntimeConfig::default()).build()?;
//! runtime.start()?;
//!
//! let mut params = Map::new();
//! params.insert("query".into(), json!("what emerges?"));
//! let outcome = runtime.execute_protocol("recursive_analysis", params, None).await?;
//! assert_eq!(outcome.output["source"], "fallback");
//!
//! runtime.shutdown().await;
//! # Ok::<(), fieldshell_runtime::RuntimeError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use crate::backend::{
    BackendDispatcher, CognitiveCollaborator, ComputeCollaborator, TranscendentCollaborator,
};
use crate::config::{ConfigError, ConfigResolver, RuntimeConfig};
use crate::engine::{EngineError, EventBus, ExecutionOutcome, FieldScheduler, ProtocolEngine, TickReport};
use crate::field::{Field, FieldSeed, FieldStore, FieldStoreError};
use crate::frame::{spawn_sweeper, ContextFrame, ContextFrameStore, FrameDraft, FrameError};
use crate::metrics::{MetricsSnapshot, RuntimeMetrics};
use crate::protocol::{ProtocolRegistry, ProtocolShell, RegistryError};
use fieldshell_event::{EventListener, FieldEventKind};
use fieldshell_types::{ErrorCode, FieldId, FrameId};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Facade-level error.
///
/// Wraps the layer errors and keeps their codes.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(EngineError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Field(#[from] FieldStoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("runtime is shut down")]
    ShuttingDown,
}

impl From<EngineError> for RuntimeError {
    fn from(err: EngineError) -> Self {
        match err {
            // a run racing shutdown reports the same as one after it
            EngineError::ShuttingDown => Self::ShuttingDown,
            other => Self::Engine(other),
        }
    }
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::Frame(e) => e.code(),
            Self::Field(e) => e.code(),
            Self::Config(_) => "RUNTIME_CONFIG_ERROR",
            Self::ShuttingDown => "RUNTIME_SHUTTING_DOWN",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Engine(e) => e.is_recoverable(),
            Self::Registry(e) => e.is_recoverable(),
            Self::Frame(e) => e.is_recoverable(),
            Self::Field(e) => e.is_recoverable(),
            Self::Config(_) | Self::ShuttingDown => false,
        }
    }
}

/// Builder for [`FieldRuntime`].
pub struct FieldRuntimeBuilder {
    config: RuntimeConfig,
    registry: Option<Arc<ProtocolRegistry>>,
    cognitive: Option<Arc<dyn CognitiveCollaborator>>,
    compute: Option<Arc<dyn ComputeCollaborator>>,
    transcendent: Option<Arc<dyn TranscendentCollaborator>>,
    seed: Option<u64>,
}

impl FieldRuntimeBuilder {
    /// Applies programmatic overrides on top of the loaded config.
    #[must_use]
    pub fn resolve(mut self, resolver: &dyn ConfigResolver) -> Self {
        resolver.apply(&mut self.config);
        self
    }

    /// Uses `registry` instead of a fresh one with the built-in shells.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ProtocolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_cognitive(mut self, collaborator: Arc<dyn CognitiveCollaborator>) -> Self {
        self.cognitive = Some(collaborator);
        self
    }

    #[must_use]
    pub fn with_compute(mut self, collaborator: Arc<dyn ComputeCollaborator>) -> Self {
        self.compute = Some(collaborator);
        self
    }

    #[must_use]
    pub fn with_transcendent(mut self, collaborator: Arc<dyn TranscendentCollaborator>) -> Self {
        self.transcendent = Some(collaborator);
        self
    }

    /// Seeds the scheduler's random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// [`RuntimeError::Config`] if the configuration is out of range.
    pub fn build(self) -> Result<FieldRuntime, RuntimeError> {
        self.config.validate()?;
        let config = self.config;

        let metrics = Arc::new(RuntimeMetrics::new());
        let store = Arc::new(FieldStore::new());
        let bus = Arc::new(EventBus::new());
        let frames = Arc::new(ContextFrameStore::new(
            config.frames.ttl(),
            Arc::clone(&metrics),
        ));

        let mut dispatcher = BackendDispatcher::new(
            config.backends.clone(),
            Arc::clone(&frames),
            Arc::clone(&metrics),
        );
        if let Some(c) = self.cognitive {
            dispatcher = dispatcher.with_cognitive(c);
        }
        if let Some(c) = self.compute {
            dispatcher = dispatcher.with_compute(c);
        }
        if let Some(c) = self.transcendent {
            dispatcher = dispatcher.with_transcendent(c);
        }

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ProtocolRegistry::with_builtins()));
        let engine = ProtocolEngine::new(
            registry,
            Arc::clone(&store),
            Arc::new(dispatcher),
            Arc::clone(&bus),
            Arc::clone(&metrics),
        );

        let mut scheduler = FieldScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&metrics),
        );
        if let Some(seed) = self.seed {
            scheduler = scheduler.with_seed(seed);
        }

        Ok(FieldRuntime {
            config,
            store,
            frames,
            bus,
            metrics,
            engine,
            scheduler: Arc::new(scheduler),
            background: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }
}

struct Background {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Protocol engine, field dynamics and context memory in one handle.
pub struct FieldRuntime {
    config: RuntimeConfig,
    store: Arc<FieldStore>,
    frames: Arc<ContextFrameStore>,
    bus: Arc<EventBus>,
    metrics: Arc<RuntimeMetrics>,
    engine: ProtocolEngine,
    scheduler: Arc<FieldScheduler>,
    background: Mutex<Option<Background>>,
    shut_down: AtomicBool,
}

impl FieldRuntime {
    #[must_use]
    pub fn builder(config: RuntimeConfig) -> FieldRuntimeBuilder {
        FieldRuntimeBuilder {
            config,
            registry: None,
            cognitive: None,
            compute: None,
            transcendent: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Starts the frame sweeper and, if enabled, the scheduler.
    ///
    /// Must be called inside a Tokio runtime. Starting twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after [`shutdown`](Self::shutdown).
    pub fn start(&self) -> Result<(), RuntimeError> {
        self.ensure_running()?;
        let mut background = self.background.lock();
        if background.is_some() {
            return Ok(());
        }

        let (tx, rx) = watch::channel(false);
        let mut tasks = vec![spawn_sweeper(
            Arc::clone(&self.frames),
            self.config.frames.sweep_interval(),
            rx.clone(),
        )];
        if self.config.scheduler.enabled {
            tasks.push(Arc::clone(&self.scheduler).spawn(rx));
        }

        info!(
            scheduler = self.config.scheduler.enabled,
            interval_ms = self.config.scheduler.interval_ms,
            "Field runtime started"
        );
        *background = Some(Background {
            shutdown: tx,
            tasks,
        });
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shut_down.load(Ordering::SeqCst) && self.background.lock().is_some()
    }

    /// Stops background tasks, cancels async steps and clears all state.
    ///
    /// Idempotent. A tick in progress finishes its current field first,
    /// so no field is left half-mutated.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.engine.close();

        let background = self.background.lock().take();
        if let Some(background) = background {
            let _ = background.shutdown.send(true);
            for task in background.tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Background task ended abnormally");
                }
            }
        }

        let fields = self.store.len();
        self.store.clear();
        self.frames.clear();
        self.bus.clear();
        info!(fields, "Field runtime shut down");
    }

    // === Fields ===

    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after shutdown.
    pub fn create_field(&self, seed: FieldSeed) -> Result<FieldId, RuntimeError> {
        self.ensure_running()?;
        Ok(self.engine.create_field(seed))
    }

    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] for an unknown id.
    pub fn field(&self, id: FieldId) -> Result<Field, RuntimeError> {
        self.ensure_running()?;
        self.store
            .get(id)
            .ok_or(RuntimeError::Field(FieldStoreError::NotFound(id)))
    }

    /// Every live field, oldest first.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after shutdown.
    pub fn list_fields(&self) -> Result<Vec<Field>, RuntimeError> {
        self.ensure_running()?;
        Ok(self.store.list())
    }

    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] for an unknown id.
    pub fn remove_field(&self, id: FieldId) -> Result<Field, RuntimeError> {
        self.ensure_running()?;
        Ok(self.store.delete(id)?)
    }

    /// Runs one scheduler tick now, outside the timer.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after shutdown.
    pub fn tick(&self) -> Result<Option<TickReport>, RuntimeError> {
        self.ensure_running()?;
        Ok(self.scheduler.tick())
    }

    // === Protocols ===

    /// # Errors
    ///
    /// See [`ProtocolEngine::execute`].
    pub async fn execute_protocol(
        &self,
        name: &str,
        params: Map<String, Value>,
        field_id: Option<FieldId>,
    ) -> Result<ExecutionOutcome, RuntimeError> {
        self.ensure_running()?;
        Ok(self.engine.execute(name, params, field_id).await?)
    }

    /// # Errors
    ///
    /// [`RegistryError`] for an empty or duplicate name or bad reliability.
    pub fn register_protocol(&self, shell: ProtocolShell) -> Result<(), RuntimeError> {
        self.ensure_running()?;
        Ok(self.engine.registry().register(shell)?)
    }

    #[must_use]
    pub fn protocol_names(&self) -> Vec<String> {
        self.engine.registry().names()
    }

    // === Context frames ===

    /// # Errors
    ///
    /// [`FrameError::OutOfRange`] for importance or confidence outside `[0, 1]`.
    pub fn add_context_frame(&self, draft: FrameDraft) -> Result<FrameId, RuntimeError> {
        self.ensure_running()?;
        Ok(self.frames.add(draft)?)
    }

    /// Reads a frame, counting the access.
    ///
    /// # Errors
    ///
    /// [`FrameError::NotFound`] for an unknown or expired frame.
    pub fn context_frame(&self, id: FrameId) -> Result<ContextFrame, RuntimeError> {
        self.ensure_running()?;
        self.frames
            .get(id)
            .ok_or(RuntimeError::Frame(FrameError::NotFound(id)))
    }

    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after shutdown.
    pub fn search_context_frames(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContextFrame>, RuntimeError> {
        self.ensure_running()?;
        Ok(self.frames.search(query, limit))
    }

    /// # Errors
    ///
    /// See [`ContextFrameStore::relate`].
    pub fn relate_frames(
        &self,
        from: FrameId,
        to: FrameId,
        relation_type: &str,
        strength: f64,
        bidirectional: bool,
    ) -> Result<(), RuntimeError> {
        self.ensure_running()?;
        Ok(self
            .frames
            .relate(from, to, relation_type, strength, bidirectional)?)
    }

    // === Events and metrics ===

    /// Returns `false` if a listener with the same id is already registered.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ShuttingDown`] after shutdown.
    pub fn add_event_listener(
        &self,
        kind: FieldEventKind,
        listener: Arc<dyn EventListener>,
    ) -> Result<bool, RuntimeError> {
        self.ensure_running()?;
        Ok(self.bus.subscribe(kind, listener))
    }

    pub fn remove_event_listener(&self, kind: FieldEventKind, listener_id: &str) -> bool {
        self.bus.unsubscribe(kind, listener_id)
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.len(), self.frames.len())
    }

    fn ensure_running(&self) -> Result<(), RuntimeError> {
        if self.shut_down.load(Ordering::SeqCst) {
            Err(RuntimeError::ShuttingDown)
        } else {
            Ok(())
        }
    }
}
