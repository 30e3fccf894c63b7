//! TTL-bounded context frame store.
//!
//! Expiry is measured from a frame's creation `timestamp`, not from its
//! last access. Expired frames are dropped lazily (a read of an expired
//! frame removes it) and eagerly by the sweeper task started with
//! [`spawn_sweeper`].

use super::{ContextFrame, FrameDraft, FrameError, FrameMetadata, FrameRelation};
use crate::metrics::RuntimeMetrics;
use chrono::{DateTime, Utc};
use fieldshell_types::FrameId;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct ContextFrameStore {
    frames: RwLock<HashMap<FrameId, ContextFrame>>,
    ttl: Duration,
    metrics: Arc<RuntimeMetrics>,
}

impl ContextFrameStore {
    #[must_use]
    pub fn new(ttl: Duration, metrics: Arc<RuntimeMetrics>) -> Self {
        Self {
            frames: RwLock::new(HashMap::new()),
            ttl,
            metrics,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a new frame.
    ///
    /// # Errors
    ///
    /// [`FrameError::OutOfRange`] if importance or confidence is outside `[0, 1]`.
    pub fn add(&self, draft: FrameDraft) -> Result<FrameId, FrameError> {
        unit_range("importance", draft.importance)?;
        unit_range("confidence", draft.confidence)?;

        let id = FrameId::new();
        let now = Utc::now();
        let frame = ContextFrame {
            id,
            content: draft.content,
            metadata: FrameMetadata {
                frame_type: draft.frame_type,
                timestamp: now,
                importance: draft.importance,
                decay_rate: draft.decay_rate,
                access_count: 0,
                last_accessed: now,
                source: draft.source,
                confidence: draft.confidence,
            },
            relations: Vec::new(),
        };

        self.frames.write().insert(id, frame);
        self.metrics.record_frame_created();
        debug!(frame_id = %id, "Context frame added");
        Ok(id)
    }

    /// Returns a frame and records the access.
    ///
    /// An expired frame is removed and reported as absent.
    pub fn get(&self, id: FrameId) -> Option<ContextFrame> {
        let now = Utc::now();
        let mut frames = self.frames.write();

        let expired = self.is_expired(frames.get(&id)?, now);
        if expired {
            frames.remove(&id);
            self.metrics.record_frame_expired();
            return None;
        }

        let frame = frames.get_mut(&id)?;
        touch(frame, now);
        Some(frame.clone())
    }

    /// Case-insensitive substring search over live frames.
    ///
    /// Results are ordered by importance (descending), ties broken by
    /// most recent creation. Every returned frame records an access.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ContextFrame> {
        let now = Utc::now();
        let needle = query.to_lowercase();
        let mut frames = self.frames.write();

        let mut hits: Vec<&mut ContextFrame> = frames
            .values_mut()
            .filter(|f| !is_expired_at(f, self.ttl, now))
            .filter(|f| f.content.to_lowercase().contains(&needle))
            .collect();

        hits.sort_by(|a, b| rank(a, b));
        hits.truncate(limit);

        hits.into_iter()
            .map(|frame| {
                touch(frame, now);
                frame.clone()
            })
            .collect()
    }

    /// Adds a relation from `from` to `to`; bidirectional relations also
    /// add the reverse edge on `to`.
    ///
    /// # Errors
    ///
    /// [`FrameError::NotFound`] if either frame is absent,
    /// [`FrameError::SelfRelation`] if `from == to`,
    /// [`FrameError::OutOfRange`] if strength is outside `[0, 1]`.
    pub fn relate(
        &self,
        from: FrameId,
        to: FrameId,
        relation_type: impl Into<String>,
        strength: f64,
        bidirectional: bool,
    ) -> Result<(), FrameError> {
        if from == to {
            return Err(FrameError::SelfRelation(from));
        }
        unit_range("strength", strength)?;

        let relation_type = relation_type.into();
        let mut frames = self.frames.write();
        if !frames.contains_key(&to) {
            return Err(FrameError::NotFound(to));
        }
        let source = frames.get_mut(&from).ok_or(FrameError::NotFound(from))?;
        source.relations.push(FrameRelation {
            target: to,
            relation_type: relation_type.clone(),
            strength,
            bidirectional,
        });

        if bidirectional {
            if let Some(target) = frames.get_mut(&to) {
                target.relations.push(FrameRelation {
                    target: from,
                    relation_type,
                    strength,
                    bidirectional,
                });
            }
        }
        Ok(())
    }

    pub fn remove(&self, id: FrameId) -> Option<ContextFrame> {
        self.frames.write().remove(&id)
    }

    /// Drops every frame older than the TTL. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    /// Same as [`purge_expired`](Self::purge_expired) against an explicit clock.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut frames = self.frames.write();
        let before = frames.len();
        frames.retain(|_, f| !is_expired_at(f, self.ttl, now));
        let purged = before - frames.len();
        if purged > 0 {
            self.metrics.record_frames_expired_n(purged as u64);
            debug!(purged, remaining = frames.len(), "Expired context frames purged");
        }
        purged
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }

    pub fn clear(&self) {
        self.frames.write().clear();
    }

    fn is_expired(&self, frame: &ContextFrame, now: DateTime<Utc>) -> bool {
        is_expired_at(frame, self.ttl, now)
    }
}

/// Starts a task that purges expired frames every `interval` until
/// `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_sweeper(
    store: Arc<ContextFrameStore>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    store.purge_expired();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Frame sweeper stopping");
                        break;
                    }
                }
            }
        }
    })
}

fn is_expired_at(frame: &ContextFrame, ttl: Duration, now: DateTime<Utc>) -> bool {
    (now - frame.metadata.timestamp)
        .to_std()
        .map_or(false, |age| age >= ttl)
}

fn touch(frame: &mut ContextFrame, now: DateTime<Utc>) {
    frame.metadata.access_count += 1;
    if now > frame.metadata.last_accessed {
        frame.metadata.last_accessed = now;
    }
}

fn rank(a: &ContextFrame, b: &ContextFrame) -> Ordering {
    b.metadata
        .importance
        .total_cmp(&a.metadata.importance)
        .then_with(|| b.metadata.timestamp.cmp(&a.metadata.timestamp))
}

fn unit_range(name: &'static str, value: f64) -> Result<(), FrameError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FrameError::OutOfRange { name, value })
    }
}
