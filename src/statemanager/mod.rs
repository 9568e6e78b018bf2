//! # Generator State Manager
//!
//! Transactional bookkeeping for generator-produced artifacts during a single
//! reconcile of an owning resource.
//!
//! A reconciler stages ledger changes with the `enqueue_*` methods while it
//! processes its generator references, then calls [`StateManager::commit`] if
//! the reconcile succeeded or [`StateManager::rollback`] if it failed. Nothing
//! touches the ledger before one of those is called.
//!
//! Rolling back a freshly generated artifact destroys it immediately. If that
//! cleanup fails, the artifact is filed into `GC` under a unique key instead,
//! so no externally created credential is forgotten.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut manager = runtime.state_manager(&mut external_secret, client, "default");
//! manager.enqueue_flag_latest_state_for_gc("db-token");
//! manager.enqueue_set_latest("db-token", spec, generator, output.state);
//! match reconcile_result {
//!     Ok(()) => manager.commit().await?,
//!     Err(_) => manager.rollback().await?,
//! }
//! manager.garbage_collect().await?;
//! ```

mod error;
mod gc;
mod scheduler;

pub use error::{AggregateError, StateError};
pub use gc::{cleanup_immediate, garbage_collect};
pub use scheduler::{gc_key, GcEntry, GcScheduler, SchedulerError};

use crate::crd::{GeneratorGcState, GeneratorLedger, GeneratorResourceState, HasGeneratorState};
use crate::generator::{cleanup_idempotent, Generator, GeneratorRegistry};
use crate::observability::metrics;
use chrono::Utc;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A staged ledger change with its commit and rollback behaviour
enum QueueItem {
    /// Commit: write `Latest[key]`. Rollback: destroy the artifact, or file it into `GC`.
    SetLatest {
        key: String,
        resource_spec: serde_json::Value,
        generator: Arc<dyn Generator>,
        provider_state: Option<serde_json::Value>,
    },
    /// Commit: move the existing `Latest[key]` into `GC`. Rollback: nothing.
    FlagLatestForGc { key: String },
    /// Commit: file the artifact into `GC` and schedule a cleanup attempt. Rollback: nothing.
    MoveToGc {
        key: String,
        resource_spec: serde_json::Value,
        generator: Arc<dyn Generator>,
        provider_state: Option<serde_json::Value>,
    },
}

impl QueueItem {
    fn name(&self) -> &'static str {
        match self {
            QueueItem::SetLatest { .. } => "set-latest",
            QueueItem::FlagLatestForGc { .. } => "flag-latest-for-gc",
            QueueItem::MoveToGc { .. } => "move-to-gc",
        }
    }
}

/// Per-reconcile transactional helper over an owning resource's generator ledger
///
/// Not shared between reconciles and not synchronized.
pub struct StateManager<'a, R: HasGeneratorState> {
    resource: &'a mut R,
    client: Client,
    namespace: String,
    registry: Arc<GeneratorRegistry>,
    scheduler: GcScheduler,
    queue: Vec<QueueItem>,
}

impl<R: HasGeneratorState> std::fmt::Debug for StateManager<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("namespace", &self.namespace)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<'a, R: HasGeneratorState> StateManager<'a, R> {
    pub fn new(
        resource: &'a mut R,
        client: Client,
        namespace: impl Into<String>,
        registry: Arc<GeneratorRegistry>,
        scheduler: GcScheduler,
    ) -> Self {
        Self {
            resource,
            client,
            namespace: namespace.into(),
            registry,
            scheduler,
            queue: Vec::new(),
        }
    }

    /// The owning resource, including any ledger changes applied so far
    pub fn resource(&self) -> &R {
        self.resource
    }

    /// Number of staged operations
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Look up the active artifact for `key` without side effects
    #[must_use]
    pub fn get_latest(&self, key: &str) -> Option<GeneratorResourceState> {
        self.resource.generator_state().latest.get(key).cloned()
    }

    /// Stage recording a freshly generated artifact as `Latest[key]`
    pub fn enqueue_set_latest(
        &mut self,
        key: impl Into<String>,
        resource_spec: serde_json::Value,
        generator: Arc<dyn Generator>,
        provider_state: Option<serde_json::Value>,
    ) {
        self.queue.push(QueueItem::SetLatest {
            key: key.into(),
            resource_spec,
            generator,
            provider_state,
        });
    }

    /// Stage moving the current `Latest[key]` (if any) into `GC`
    pub fn enqueue_flag_latest_state_for_gc(&mut self, key: impl Into<String>) {
        self.queue.push(QueueItem::FlagLatestForGc { key: key.into() });
    }

    /// Stage filing an artifact directly into `GC`
    pub fn enqueue_move_state_to_gc(
        &mut self,
        key: impl Into<String>,
        resource_spec: serde_json::Value,
        generator: Arc<dyn Generator>,
        provider_state: Option<serde_json::Value>,
    ) {
        self.queue.push(QueueItem::MoveToGc {
            key: key.into(),
            resource_spec,
            generator,
            provider_state,
        });
    }

    /// Apply every staged operation's commit, in enqueue order
    ///
    /// A failing operation does not stop the ones after it.
    pub async fn commit(&mut self) -> Result<(), AggregateError> {
        let queue = std::mem::take(&mut self.queue);
        debug!("Committing {} generator state operations", queue.len());

        let mut ledger = self.resource.generator_state();
        let mut errors = AggregateError::default();
        for item in queue {
            let name = item.name();
            if let Err(e) = self.commit_item(&mut ledger, item) {
                warn!("Generator state {} commit failed: {}", name, e);
                errors.push(e);
            }
        }
        self.resource.set_generator_state(ledger);

        errors.into_result()
    }

    /// Apply every staged operation's rollback, in enqueue order
    ///
    /// Never returns an error today: a cleanup that fails during rollback is
    /// filed into `GC` under a fresh key and left for the sweep, not reported.
    pub async fn rollback(&mut self) -> Result<(), AggregateError> {
        let queue = std::mem::take(&mut self.queue);
        debug!("Rolling back {} generator state operations", queue.len());

        let mut ledger = self.resource.generator_state();
        for item in queue {
            self.rollback_item(&mut ledger, item).await;
        }
        self.resource.set_generator_state(ledger);

        Ok(())
    }

    /// Sweep `GC` entries whose grace period has elapsed
    pub async fn garbage_collect(&mut self) -> Result<(), AggregateError> {
        garbage_collect(
            &mut *self.resource,
            &self.registry,
            &self.scheduler,
            &self.client,
            &self.namespace,
        )
        .await
    }

    /// Clean every `GC` entry now, ignoring the grace period
    pub async fn cleanup_immediate(&mut self) -> Result<(), AggregateError> {
        cleanup_immediate(
            &mut *self.resource,
            &self.registry,
            &self.client,
            &self.namespace,
        )
        .await
    }

    fn commit_item(&self, ledger: &mut GeneratorLedger, item: QueueItem) -> Result<(), StateError> {
        let now = Utc::now();
        match item {
            QueueItem::SetLatest {
                key,
                resource_spec,
                provider_state,
                ..
            } => {
                ledger.latest.insert(
                    key,
                    GeneratorResourceState {
                        resource_spec,
                        provider_state,
                    },
                );
                Ok(())
            }
            QueueItem::FlagLatestForGc { key } => {
                let Some(latest) = ledger.latest.remove(&key) else {
                    return Ok(());
                };
                let gc_key = gc_key(&key, &latest.resource_spec, latest.provider_state.as_ref());
                let resolved = self.registry.resolve(&latest.resource_spec);
                ledger
                    .gc
                    .entry(gc_key.clone())
                    .or_insert_with(|| GeneratorGcState::from_resource_state(latest.clone(), now));

                // The entry is in GC either way; an unresolvable generator is
                // reported now and again on every sweep until fixed.
                let generator = resolved.map_err(|e| StateError::Resolve {
                    key: gc_key.clone(),
                    source: e,
                })?;
                debug!("Flagged {} for garbage collection as {}", key, gc_key);
                self.schedule(GcEntry {
                    state_key: key,
                    generator,
                    resource_spec: latest.resource_spec,
                    provider_state: latest.provider_state,
                });
                Ok(())
            }
            QueueItem::MoveToGc {
                key,
                resource_spec,
                generator,
                provider_state,
            } => {
                let entry = GcEntry {
                    state_key: key,
                    generator,
                    resource_spec,
                    provider_state,
                };
                ledger.gc.entry(entry.key()).or_insert_with(|| GeneratorGcState {
                    resource_spec: entry.resource_spec.clone(),
                    provider_state: entry.provider_state.clone(),
                    flagged_at: now,
                });
                self.schedule(entry);
                Ok(())
            }
        }
    }

    async fn rollback_item(&self, ledger: &mut GeneratorLedger, item: QueueItem) {
        let QueueItem::SetLatest {
            key,
            resource_spec,
            generator,
            provider_state,
        } = item
        else {
            return;
        };

        match cleanup_idempotent(
            generator.as_ref(),
            &resource_spec,
            provider_state.as_ref(),
            &self.client,
            &self.namespace,
        )
        .await
        {
            Ok(()) => {
                metrics::increment_gc_cleanups("rollback");
                info!("Rolled back generated resource for {}", key);
            }
            Err(e) => {
                // Keep the artifact on the books so a later sweep destroys it.
                let fallback_key = format!("[{key}]-{}", uuid::Uuid::new_v4());
                warn!(
                    "Cleanup during rollback of {} failed, filing into GC as {}: {}",
                    key, fallback_key, e
                );
                metrics::increment_rollback_absorbed();
                ledger.gc.insert(
                    fallback_key,
                    GeneratorGcState {
                        resource_spec,
                        provider_state,
                        flagged_at: Utc::now(),
                    },
                );
            }
        }
    }

    fn schedule(&self, entry: GcEntry) {
        let key = entry.key();
        if let Err(e) = self
            .scheduler
            .enqueue(entry, self.client.clone(), &self.namespace)
        {
            // Best effort only; the sweep still picks the entry up.
            warn!("Could not schedule cleanup of {}: {}", key, e);
        }
    }
}

impl<R: HasGeneratorState> Drop for StateManager<'_, R> {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            warn!(
                "State manager dropped with {} uncommitted generator state operations",
                self.queue.len()
            );
        }
    }
}
