//! Activation coordinator
//!
//! Maintains the single-active rule across a collection the store can only
//! update one entity at a time:
//! - `activate` switches off every other active entity and switches on the
//!   target, all in one concurrent fan-out
//! - `deactivate` switches off one entity
//! - `reconcile` repairs a collection left with several active entities
//!
//! Calls are issued concurrently, but cache mutations for an operation are
//! applied together under the cache write lock once every call has settled.
//! Only confirmed writes touch the cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::cache::EntityCache;
use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::fanout::{fan_out, CallOutcome};
use crate::reconciler;
use crate::store::RemoteStore;
use crate::types::{
    ActivationPlan, ActivationReport, CollectionStatus, DeactivationReport, Entity, EntityId,
    ReconcileReport,
};

pub struct Coordinator<S> {
    store: Arc<S>,
    cache: Arc<RwLock<EntityCache>>,
    limiter: Arc<Semaphore>,
    config: CoordinatorConfig,
}

impl<S: RemoteStore> Coordinator<S> {
    /// Create a coordinator with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, CoordinatorConfig::default())
    }

    pub fn with_config(store: S, config: CoordinatorConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create from a store the caller keeps a handle to.
    pub fn from_shared(store: Arc<S>, config: CoordinatorConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_calls.max(1)));
        Self {
            store,
            cache: Arc::new(RwLock::new(EntityCache::new())),
            limiter,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ==================== Cache ====================

    /// List the store and replace the cached view.
    pub async fn refresh(&self) -> Result<CollectionStatus> {
        let entities = self.store.list().await?;
        self.load(entities).await;
        Ok(self.status().await)
    }

    /// Replace the cached view with an already fetched listing.
    pub async fn load(&self, entities: Vec<Entity>) {
        let mut cache = self.cache.write().await;
        cache.load(entities);
        debug!(entities = cache.len(), "Cache loaded");
    }

    pub async fn status(&self) -> CollectionStatus {
        self.cache.read().await.status()
    }

    /// Cached entities in id order.
    pub async fn snapshot(&self) -> Vec<Entity> {
        self.cache.read().await.entities().cloned().collect()
    }

    // ==================== Activate ====================

    /// Preview an activation from the cache without issuing any call.
    pub async fn plan_activation(&self, id: &EntityId) -> Result<ActivationPlan> {
        let cache = self.cache.read().await;
        let target = cache.get(id)?;

        Ok(ActivationPlan {
            target: id.clone(),
            already_active: target.active,
            to_deactivate: cache
                .active_entities()
                .into_iter()
                .filter(|e| &e.id != id)
                .map(|e| e.id.clone())
                .collect(),
        })
    }

    /// Make `id` the only active entity, using the configured deadline.
    pub async fn activate(&self, id: &EntityId) -> Result<ActivationReport> {
        self.run_activation(id, self.config.fan_out_timeout()).await
    }

    /// Make `id` the only active entity, giving up on calls after `timeout`.
    pub async fn activate_within(&self, id: &EntityId, timeout: Duration) -> Result<ActivationReport> {
        self.run_activation(id, Some(timeout)).await
    }

    async fn run_activation(
        &self,
        id: &EntityId,
        timeout: Option<Duration>,
    ) -> Result<ActivationReport> {
        let plan = self.plan_activation(id).await?;

        let mut updates: Vec<(EntityId, bool)> = plan
            .to_deactivate
            .iter()
            .map(|other| (other.clone(), false))
            .collect();
        if !plan.already_active {
            updates.push((id.clone(), true));
        }

        let calls_issued = updates.len();
        let outcomes = if updates.is_empty() {
            Vec::new()
        } else {
            fan_out(self.store.as_ref(), updates, &self.limiter, timeout).await
        };
        self.apply(&outcomes).await;

        let mut report = ActivationReport {
            activated_id: id.clone(),
            activated: plan.already_active,
            deactivated_ids: BTreeSet::new(),
            failures: BTreeMap::new(),
            calls_issued,
        };

        for outcome in outcomes {
            match outcome.result {
                Ok(()) if outcome.active => report.activated = true,
                Ok(()) => {
                    report.deactivated_ids.insert(outcome.id);
                }
                Err(failure) => {
                    report.failures.insert(outcome.id, failure);
                }
            }
        }

        if report.has_failures() {
            warn!(
                entity_id = %id,
                activated = report.activated,
                failed = report.failures.len(),
                "Activation partially failed"
            );
        } else {
            info!(
                entity_id = %id,
                calls = calls_issued,
                deactivated = report.deactivated_ids.len(),
                "Activation complete"
            );
        }

        Ok(report)
    }

    // ==================== Deactivate ====================

    /// Switch off one entity, using the configured deadline.
    ///
    /// The call is issued even when the cache already shows the entity
    /// inactive; the store stays the authority.
    pub async fn deactivate(&self, id: &EntityId) -> Result<DeactivationReport> {
        self.run_deactivation(id, self.config.fan_out_timeout()).await
    }

    pub async fn deactivate_within(
        &self,
        id: &EntityId,
        timeout: Duration,
    ) -> Result<DeactivationReport> {
        self.run_deactivation(id, Some(timeout)).await
    }

    async fn run_deactivation(
        &self,
        id: &EntityId,
        timeout: Option<Duration>,
    ) -> Result<DeactivationReport> {
        self.cache.read().await.get(id)?;

        let outcomes = fan_out(
            self.store.as_ref(),
            vec![(id.clone(), false)],
            &self.limiter,
            timeout,
        )
        .await;
        self.apply(&outcomes).await;

        let failure = outcomes.into_iter().find_map(|o| o.result.err());
        info!(entity_id = %id, failed = failure.is_some(), "Deactivation finished");

        Ok(DeactivationReport {
            deactivated_id: id.clone(),
            failed: failure.is_some(),
            failure,
        })
    }

    // ==================== Reconcile ====================

    /// Repair a violation in a freshly listed collection.
    ///
    /// The listing replaces the cache before planning. Failed deactivations
    /// are returned as residue; the sweep does not promise the rule holds
    /// afterwards, only that convergence was attempted.
    pub async fn reconcile(&self, entities: Vec<Entity>) -> ReconcileReport {
        self.run_reconcile(entities, self.config.fan_out_timeout()).await
    }

    pub async fn reconcile_within(&self, entities: Vec<Entity>, timeout: Duration) -> ReconcileReport {
        self.run_reconcile(entities, Some(timeout)).await
    }

    /// List the store, then reconcile against that listing.
    pub async fn refresh_and_reconcile(&self) -> Result<ReconcileReport> {
        let entities = self.store.list().await?;
        Ok(self.reconcile(entities).await)
    }

    async fn run_reconcile(
        &self,
        entities: Vec<Entity>,
        timeout: Option<Duration>,
    ) -> ReconcileReport {
        let plan = reconciler::plan(&entities);
        self.load(entities).await;

        if !plan.violation_found {
            debug!("No violation found");
            return ReconcileReport {
                kept_active_id: plan.keep,
                ..Default::default()
            };
        }

        warn!(
            kept = ?plan.keep,
            extra = plan.to_deactivate.len(),
            "Multiple active entities, reconciling"
        );

        let updates: Vec<(EntityId, bool)> = plan
            .to_deactivate
            .iter()
            .map(|id| (id.clone(), false))
            .collect();
        let calls_issued = updates.len();
        let outcomes = fan_out(self.store.as_ref(), updates, &self.limiter, timeout).await;
        self.apply(&outcomes).await;

        let mut report = ReconcileReport {
            kept_active_id: plan.keep,
            violation_found: true,
            calls_issued,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => {
                    report.deactivated_ids.insert(outcome.id);
                }
                Err(failure) => {
                    report.failures.insert(outcome.id, failure);
                }
            }
        }

        if report.has_residue() {
            warn!(residue = report.failures.len(), "Reconciliation left active extras");
        } else {
            info!(
                kept = ?report.kept_active_id,
                deactivated = report.deactivated_ids.len(),
                "Reconciliation complete"
            );
        }

        report
    }

    /// Apply confirmed writes to the cache in one critical section.
    async fn apply(&self, outcomes: &[CallOutcome]) {
        if outcomes.iter().all(|o| o.result.is_err()) {
            return;
        }

        let mut cache = self.cache.write().await;
        for outcome in outcomes.iter().filter(|o| o.succeeded()) {
            cache.apply_active(&outcome.id, outcome.active);
        }
    }
}

impl<S> Clone for Coordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            limiter: Arc::clone(&self.limiter),
            config: self.config.clone(),
        }
    }
}
