//! In-memory store for tests and dry runs.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{RemoteStore, StoreError, StoreResult};
use crate::types::{Entity, EntityId};

/// A `set_active` call as the store received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub id: EntityId,
    pub active: bool,
}

#[derive(Debug, Clone)]
enum Behavior {
    Fail(StoreError),
    FailTimes { error: StoreError, remaining: u32 },
    Delay(Duration),
    Hang,
}

/// Mock store with scripted per-entity failures.
///
/// Every `set_active` call is recorded before its scripted behavior runs, so
/// failed and abandoned calls still show up in [`MockStore::calls`].
#[derive(Default)]
pub struct MockStore {
    entities: Mutex<BTreeMap<EntityId, Entity>>,
    behaviors: Mutex<HashMap<EntityId, Behavior>>,
    list_error: Mutex<Option<StoreError>>,
    calls: Mutex<Vec<StoreCall>>,
    list_count: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store contents.
    pub fn with_entities(self, entities: impl IntoIterator<Item = Entity>) -> Self {
        {
            let mut stored = lock(&self.entities);
            for entity in entities {
                stored.insert(entity.id.clone(), entity);
            }
        }
        self
    }

    /// Every update of `id` fails with `error`.
    pub fn fail_on(&self, id: impl Into<EntityId>, error: StoreError) {
        lock(&self.behaviors).insert(id.into(), Behavior::Fail(error));
    }

    /// The next `times` updates of `id` fail, later ones succeed.
    pub fn fail_times(&self, id: impl Into<EntityId>, times: u32, error: StoreError) {
        lock(&self.behaviors).insert(
            id.into(),
            Behavior::FailTimes {
                error,
                remaining: times,
            },
        );
    }

    /// Updates of `id` succeed after `delay`.
    pub fn delay_on(&self, id: impl Into<EntityId>, delay: Duration) {
        lock(&self.behaviors).insert(id.into(), Behavior::Delay(delay));
    }

    /// Updates of `id` never complete.
    pub fn hang_on(&self, id: impl Into<EntityId>) {
        lock(&self.behaviors).insert(id.into(), Behavior::Hang);
    }

    /// Listing fails with `error` until cleared.
    pub fn fail_list(&self, error: Option<StoreError>) {
        *lock(&self.list_error) = error;
    }

    /// Drop every scripted behavior.
    pub fn clear_behaviors(&self) {
        lock(&self.behaviors).clear();
    }

    /// Force a state directly, bypassing call recording.
    pub fn force_active(&self, id: &EntityId, active: bool) {
        if let Some(entity) = lock(&self.entities).get_mut(id) {
            entity.active = active;
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn list_count(&self) -> u32 {
        self.list_count.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
        self.list_count.store(0, Ordering::SeqCst);
    }

    pub fn entities(&self) -> Vec<Entity> {
        lock(&self.entities).values().cloned().collect()
    }

    pub fn active_ids(&self) -> Vec<EntityId> {
        lock(&self.entities)
            .values()
            .filter(|e| e.active)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Resolve the scripted behavior for one call, consuming counted failures.
    fn next_behavior(&self, id: &EntityId) -> Option<Behavior> {
        let mut behaviors = lock(&self.behaviors);
        match behaviors.get_mut(id) {
            Some(Behavior::FailTimes { error, remaining }) => {
                if *remaining == 0 {
                    behaviors.remove(id);
                    None
                } else {
                    *remaining -= 1;
                    Some(Behavior::Fail(error.clone()))
                }
            }
            other => other.cloned(),
        }
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn list(&self) -> StoreResult<Vec<Entity>> {
        self.list_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = lock(&self.list_error).clone() {
            return Err(error);
        }

        Ok(self.entities())
    }

    async fn set_active(&self, id: &EntityId, active: bool) -> StoreResult<Entity> {
        lock(&self.calls).push(StoreCall {
            id: id.clone(),
            active,
        });

        match self.next_behavior(id) {
            Some(Behavior::Fail(error)) => return Err(error),
            Some(Behavior::Delay(delay)) => tokio::time::sleep(delay).await,
            Some(Behavior::Hang) => std::future::pending::<()>().await,
            Some(Behavior::FailTimes { .. }) | None => {}
        }

        let mut entities = lock(&self.entities);
        let entity = entities
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entity.active = active;
        Ok(entity.clone())
    }
}
