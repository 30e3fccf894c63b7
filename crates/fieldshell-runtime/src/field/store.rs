//! Live field registry with per-field write serialization.
//!
//! # Locking
//!
//! ```text
//! FieldStore
//!   RwLock<HashMap<FieldId, Arc<FieldSlot>>>     (map: short critical sections)
//!                                   │
//!                   ┌───────────────┴──────────────┐
//!                   ▼                              ▼
//!     writer: tokio::Mutex<()>          state: RwLock<Field>
//!     held for a whole read-modify-     held only while copying
//!     write, across awaits              or writing the value
//! ```
//!
//! Writers (step execution, scheduler ticks) take the slot's writer lock
//! through [`FieldStore::lock`] or [`FieldStore::try_lock`] and get a
//! [`FieldGuard`]. Readers copy the current state without waiting for a
//! writer, so a long collaborator call never blocks [`FieldStore::get`].
//!
//! [`FieldGuard::mutate`] is the only path that changes `version` and
//! `updated`.

use super::{Field, FieldSeed, FieldStoreError};
use chrono::Utc;
use fieldshell_types::FieldId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

struct FieldSlot {
    writer: Arc<Mutex<()>>,
    state: RwLock<Field>,
}

/// Owns every live field.
#[derive(Default)]
pub struct FieldStore {
    fields: RwLock<HashMap<FieldId, Arc<FieldSlot>>>,
}

impl FieldStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a field from a seed and returns its id.
    pub fn create(&self, seed: FieldSeed) -> FieldId {
        let id = FieldId::new();
        let field = Field::from_seed(id, seed);
        let slot = Arc::new(FieldSlot {
            writer: Arc::new(Mutex::new(())),
            state: RwLock::new(field),
        });
        self.fields.write().insert(id, slot);
        debug!(field_id = %id, "Field created");
        id
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn get(&self, id: FieldId) -> Option<Field> {
        let slot = self.slot(id)?;
        let field = slot.state.read().clone();
        Some(field)
    }

    #[must_use]
    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.read().contains_key(&id)
    }

    /// Waits for exclusive write access to a field.
    ///
    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] if no such field exists.
    pub async fn lock(&self, id: FieldId) -> Result<FieldGuard, FieldStoreError> {
        let slot = self.slot(id).ok_or(FieldStoreError::NotFound(id))?;
        let permit = Arc::clone(&slot.writer).lock_owned().await;
        Ok(FieldGuard {
            _permit: permit,
            slot,
        })
    }

    /// Takes write access only if no other writer holds it.
    ///
    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] if no such field exists,
    /// [`FieldStoreError::Busy`] if another writer holds the lock.
    pub fn try_lock(&self, id: FieldId) -> Result<FieldGuard, FieldStoreError> {
        let slot = self.slot(id).ok_or(FieldStoreError::NotFound(id))?;
        let permit = Arc::clone(&slot.writer)
            .try_lock_owned()
            .map_err(|_| FieldStoreError::Busy(id))?;
        Ok(FieldGuard {
            _permit: permit,
            slot,
        })
    }

    /// Applies `f` under the field's writer lock and returns the new state.
    ///
    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] if no such field exists.
    pub async fn mutate<F>(&self, id: FieldId, f: F) -> Result<Field, FieldStoreError>
    where
        F: FnOnce(&mut Field),
    {
        let guard = self.lock(id).await?;
        Ok(guard.mutate(f))
    }

    /// Returns copies of every live field, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<Field> {
        let slots: Vec<Arc<FieldSlot>> = self.fields.read().values().cloned().collect();
        let mut fields: Vec<Field> = slots.iter().map(|s| s.state.read().clone()).collect();
        fields.sort_by_key(|f| f.metadata.created);
        fields
    }

    #[must_use]
    pub fn ids(&self) -> Vec<FieldId> {
        self.fields.read().keys().copied().collect()
    }

    /// Removes a field, returning its final state.
    ///
    /// A writer already holding the field finishes against the detached
    /// state; its changes are discarded.
    ///
    /// # Errors
    ///
    /// [`FieldStoreError::NotFound`] if no such field exists.
    pub fn delete(&self, id: FieldId) -> Result<Field, FieldStoreError> {
        let slot = self
            .fields
            .write()
            .remove(&id)
            .ok_or(FieldStoreError::NotFound(id))?;
        debug!(field_id = %id, "Field deleted");
        let field = slot.state.read().clone();
        Ok(field)
    }

    pub fn clear(&self) {
        self.fields.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    fn slot(&self, id: FieldId) -> Option<Arc<FieldSlot>> {
        self.fields.read().get(&id).cloned()
    }
}

/// Exclusive write access to one field.
///
/// Dropping the guard releases the field to the next writer.
pub struct FieldGuard {
    _permit: OwnedMutexGuard<()>,
    slot: Arc<FieldSlot>,
}

impl FieldGuard {
    #[must_use]
    pub fn id(&self) -> FieldId {
        self.slot.state.read().id
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Field {
        self.slot.state.read().clone()
    }

    /// Applies `f`, clamps, bumps `version` and advances `updated`.
    pub fn mutate<F>(&self, f: F) -> Field
    where
        F: FnOnce(&mut Field),
    {
        let mut state = self.slot.state.write();
        f(&mut state);
        state.clamp();
        state.metadata.version += 1;
        let now = Utc::now();
        if now > state.metadata.updated {
            state.metadata.updated = now;
        }
        state.clone()
    }
}

impl std::fmt::Debug for FieldGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGuard").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDelta;
    use std::time::Duration;

    #[test]
    fn create_applies_defaults() {
        let store = FieldStore::new();
        let id = store.create(FieldSeed::new());

        let field = store.get(id).unwrap();
        assert_eq!(field.id, id);
        assert_eq!(field.metadata.version, 1);
        assert!(field.total_weight() <= 1.0 + 1e-9);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn mutate_bumps_version_and_updated() {
        let store = FieldStore::new();
        let id = store.create(FieldSeed::new());
        let before = store.get(id).unwrap();

        let after = store
            .mutate(id, |f| f.apply(&FieldDelta::new().energy(7.0)))
            .await
            .unwrap();

        assert_eq!(after.metadata.version, 2);
        assert!(after.metadata.updated >= before.metadata.updated);
        assert!((store.get(id).unwrap().energy - 7.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn mutate_unknown_field() {
        let store = FieldStore::new();
        let missing = FieldId::new();
        let err = store.mutate(missing, |_| {}).await.unwrap_err();
        assert_eq!(err, FieldStoreError::NotFound(missing));
    }

    #[tokio::test]
    async fn mutate_clamps() {
        let store = FieldStore::new();
        let id = store.create(FieldSeed::new());
        let field = store
            .mutate(id, |f| {
                f.coherence = 4.0;
                f.energy = -1.0;
            })
            .await
            .unwrap();
        assert_eq!(field.coherence, 1.0);
        assert_eq!(field.energy, 0.0);
    }

    #[tokio::test]
    async fn try_lock_reports_busy() {
        let store = FieldStore::new();
        let id = store.create(FieldSeed::new());

        let guard = store.lock(id).await.unwrap();
        assert_eq!(store.try_lock(id).unwrap_err(), FieldStoreError::Busy(id));

        // readers are not blocked by a writer
        assert!(store.get(id).is_some());

        drop(guard);
        assert!(store.try_lock(id).is_ok());
    }

    #[tokio::test]
    async fn concurrent_mutations_are_serialized() {
        let store = Arc::new(FieldStore::new());
        let id = store.create(FieldSeed::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let guard = store.lock(id).await.unwrap();
                let energy = guard.snapshot().energy;
                tokio::time::sleep(Duration::from_millis(1)).await;
                guard.mutate(|f| f.energy = energy + 1.0);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let field = store.get(id).unwrap();
        assert!((field.energy - 21.0).abs() < 1e-9);
        assert_eq!(field.metadata.version, 17);
    }

    #[test]
    fn delete_and_list() {
        let store = FieldStore::new();
        let a = store.create(FieldSeed::new());
        let b = store.create(FieldSeed::new().tag("b"));

        assert_eq!(store.list().len(), 2);
        assert_eq!(store.delete(a).unwrap().id, a);
        assert!(store.delete(a).is_err());
        assert_eq!(store.ids(), vec![b]);

        store.clear();
        assert!(store.is_empty());
    }
}
