//! Runtime counters.
//!
//! Every component that does countable work holds an
//! `Arc<RuntimeMetrics>` and bumps it with relaxed atomics. A
//! [`MetricsSnapshot`] is a point-in-time copy for callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! counters {
    ($($name:ident => $record:ident),* $(,)?) => {
        /// Shared atomic counters.
        #[derive(Debug, Default)]
        pub struct RuntimeMetrics {
            $($name: AtomicU64,)*
        }

        impl RuntimeMetrics {
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            $(
                #[doc = concat!("Increments `", stringify!($name), "`.")]
                pub fn $record(&self) {
                    self.$name.fetch_add(1, Ordering::Relaxed);
                }
            )*

            /// Adds `n` expired frames at once.
            pub fn record_frames_expired_n(&self, n: u64) {
                self.frames_expired.fetch_add(n, Ordering::Relaxed);
            }

            /// Copies all counters, together with the live gauges.
            #[must_use]
            pub fn snapshot(&self, active_fields: usize, active_frames: usize) -> MetricsSnapshot {
                MetricsSnapshot {
                    timestamp: Utc::now(),
                    active_fields,
                    active_frames,
                    $($name: self.$name.load(Ordering::Relaxed),)*
                }
            }
        }

        /// Point-in-time copy of [`RuntimeMetrics`].
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct MetricsSnapshot {
            pub timestamp: DateTime<Utc>,
            pub active_fields: usize,
            pub active_frames: usize,
            $(pub $name: u64,)*
        }
    };
}

counters! {
    protocols_executed => record_protocol_executed,
    protocols_failed => record_protocol_failed,
    steps_executed => record_step_executed,
    steps_skipped => record_step_skipped,
    async_steps_started => record_async_step_started,
    async_steps_failed => record_async_step_failed,
    fallbacks => record_fallback,
    fields_created => record_field_created,
    scheduler_ticks => record_scheduler_tick,
    scheduler_fields_skipped => record_scheduler_field_skipped,
    emergence_events => record_emergence_event,
    frames_created => record_frame_created,
    frames_expired => record_frame_expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = RuntimeMetrics::new();
        metrics.record_protocol_executed();
        metrics.record_protocol_executed();
        metrics.record_fallback();
        metrics.record_frames_expired_n(3);
        metrics.record_frame_expired();

        let snap = metrics.snapshot(2, 5);
        assert_eq!(snap.protocols_executed, 2);
        assert_eq!(snap.fallbacks, 1);
        assert_eq!(snap.frames_expired, 4);
        assert_eq!(snap.steps_executed, 0);
        assert_eq!(snap.active_fields, 2);
        assert_eq!(snap.active_frames, 5);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let value = serde_json::to_value(RuntimeMetrics::new().snapshot(0, 0)).unwrap();
        assert_eq!(value["protocolsExecuted"], 0);
        assert_eq!(value["schedulerFieldsSkipped"], 0);
        assert!(value.get("activeFrames").is_some());
    }
}
