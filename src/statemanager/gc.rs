//! # Garbage Collection Sweep
//!
//! Authoritative passes over an owning resource's `GC` ledger entries.
//!
//! - [`garbage_collect`]: cleans entries whose grace period has elapsed
//! - [`cleanup_immediate`]: cleans every entry, used while the owning resource is finalized
//!
//! Both rebuild the `GC` map from scratch. An entry leaves the ledger only when
//! its cleanup succeeded; entries that are not yet due, whose generator cannot
//! be resolved, or whose cleanup failed are kept for the next pass.

use chrono::Utc;
use crate::crd::{GeneratorGcState, HasGeneratorState};
use crate::generator::GeneratorRegistry;
use crate::observability::metrics;
use crate::statemanager::error::{AggregateError, StateError};
use crate::statemanager::scheduler::{cleanup_entry, GcEntry, GcScheduler};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Sweep `GC` entries that are due, removing the ones cleaned successfully
pub async fn garbage_collect<R: HasGeneratorState>(
    resource: &mut R,
    registry: &GeneratorRegistry,
    scheduler: &GcScheduler,
    client: &Client,
    namespace: &str,
) -> Result<(), AggregateError> {
    sweep(resource, registry, Some(scheduler), client, namespace, "sweep").await
}

/// Attempt cleanup of every `GC` entry regardless of grace period
///
/// Failures are aggregated; failed entries stay in the ledger.
pub async fn cleanup_immediate<R: HasGeneratorState>(
    resource: &mut R,
    registry: &GeneratorRegistry,
    client: &Client,
    namespace: &str,
) -> Result<(), AggregateError> {
    sweep(resource, registry, None, client, namespace, "immediate").await
}

async fn sweep<R: HasGeneratorState>(
    resource: &mut R,
    registry: &GeneratorRegistry,
    gate: Option<&GcScheduler>,
    client: &Client,
    namespace: &str,
    source: &'static str,
) -> Result<(), AggregateError> {
    let mut ledger = resource.generator_state();
    if ledger.gc.is_empty() {
        metrics::set_gc_entries_pending(0);
        return Ok(());
    }

    let mut retained: BTreeMap<String, GeneratorGcState> = BTreeMap::new();
    let mut errors = AggregateError::default();
    let total = ledger.gc.len();

    for (key, state) in std::mem::take(&mut ledger.gc) {
        if let Some(scheduler) = gate {
            if !scheduler.is_due(state.flagged_at, Utc::now()) {
                debug!("GC entry {} not yet due (flagged at {})", key, state.flagged_at);
                retained.insert(key, state);
                continue;
            }
        }

        let generator = match registry.resolve(&state.resource_spec) {
            Ok(generator) => generator,
            Err(e) => {
                error!("Cannot resolve generator for GC entry {}: {}", key, e);
                errors.push(StateError::Resolve {
                    key: key.clone(),
                    source: e,
                });
                retained.insert(key, state);
                continue;
            }
        };

        let entry = GcEntry {
            state_key: key.clone(),
            generator,
            resource_spec: state.resource_spec.clone(),
            provider_state: state.provider_state.clone(),
        };

        match cleanup_entry(&key, &entry, client, namespace).await {
            Ok(()) => {
                metrics::increment_gc_cleanups(source);
                info!("Cleaned up generated resource {}", key);
            }
            Err(e) => {
                metrics::increment_gc_cleanup_errors(source);
                error!("Failed to clean up generated resource {}: {}", key, e);
                errors.push(StateError::Cleanup {
                    key: key.clone(),
                    source: e,
                });
                retained.insert(key, state);
            }
        }
    }

    debug!(
        "GC {} pass finished: {} of {} entries retained",
        source,
        retained.len(),
        total
    );
    ledger.gc = retained;
    metrics::set_gc_entries_pending(ledger.gc.len());
    resource.set_generator_state(ledger);

    errors.into_result()
}
