//! Field dynamics scheduler.
//!
//! Every `interval_ms` each live field is evolved by one tick
//! ([`dynamics::evolve`]) and scored ([`dynamics::emergence_score`]). A
//! score above `emergence_threshold` publishes `emergence_detected`.
//!
//! A tick never waits for a field: fields currently held by a protocol
//! run are skipped until the next tick. A tick still in progress when the
//! next one is due causes that one to be skipped, not queued.

use super::EventBus;
use crate::config::SchedulerConfig;
use crate::field::{dynamics, FieldStore, FieldStoreError};
use crate::metrics::RuntimeMetrics;
use fieldshell_event::{FieldEvent, FieldEventKind};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evolved: usize,
    /// Fields held by another writer.
    pub skipped: usize,
    pub emergent: usize,
}

pub struct FieldScheduler {
    config: SchedulerConfig,
    store: Arc<FieldStore>,
    bus: Arc<EventBus>,
    metrics: Arc<RuntimeMetrics>,
    rng: Mutex<StdRng>,
    ticking: AtomicBool,
}

impl FieldScheduler {
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        store: Arc<FieldStore>,
        bus: Arc<EventBus>,
        metrics: Arc<RuntimeMetrics>,
    ) -> Self {
        Self {
            config,
            store,
            bus,
            metrics,
            rng: Mutex::new(StdRng::from_entropy()),
            ticking: AtomicBool::new(false),
        }
    }

    /// Replaces the random source with a seeded one, for replayable ticks.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs one tick over every live field.
    ///
    /// Returns `None` if another tick is still running.
    pub fn tick(&self) -> Option<TickReport> {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Scheduler tick still running, skipping");
            return None;
        }
        let report = self.run_tick();
        self.ticking.store(false, Ordering::Release);

        self.metrics.record_scheduler_tick();
        trace!(
            evolved = report.evolved,
            skipped = report.skipped,
            emergent = report.emergent,
            "Scheduler tick"
        );
        Some(report)
    }

    fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for id in self.store.ids() {
            let guard = match self.store.try_lock(id) {
                Ok(guard) => guard,
                Err(FieldStoreError::Busy(_)) => {
                    report.skipped += 1;
                    self.metrics.record_scheduler_field_skipped();
                    continue;
                }
                // removed since ids() was taken
                Err(FieldStoreError::NotFound(_)) => continue,
            };

            let field = {
                let mut rng = self.rng.lock();
                guard.mutate(|f| dynamics::evolve(f, self.config.decay_rate, &mut *rng))
            };
            drop(guard);
            report.evolved += 1;

            let score = dynamics::emergence_score(&field);
            if score > self.config.emergence_threshold {
                report.emergent += 1;
                self.metrics.record_emergence_event();
                debug!(field_id = %id, score, "Emergence detected");
                let event = FieldEvent::new(
                    FieldEventKind::EmergenceDetected,
                    id,
                    json!({"score": score, "metrics": field.metrics()}),
                )
                .with_metadata("source", json!("scheduler"));
                self.bus.publish(&event);
            }
        }

        report
    }

    /// Starts the tick loop until `shutdown` flips to `true` or its
    /// sender is dropped.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // first tick fires immediately

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
