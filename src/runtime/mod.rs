//! # Runtime
//!
//! Process-wide generator runtime shared by every reconciler.
//!
//! - `initialization`: startup wiring (metrics, scheduler, registry, client, server)

pub mod initialization;

use crate::config::ControllerConfig;
use crate::crd::HasGeneratorState;
use crate::generator::GeneratorRegistry;
use crate::statemanager::{GcScheduler, StateManager};
use kube::Client;
use std::sync::Arc;

/// The one generator registry and GC scheduler of this process
///
/// Cheap to clone; clones share the same scheduler.
#[derive(Debug, Clone)]
pub struct GeneratorRuntime {
    pub registry: Arc<GeneratorRegistry>,
    pub scheduler: GcScheduler,
}

impl GeneratorRuntime {
    /// Start the scheduler with the configured grace period
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(config: &ControllerConfig, registry: GeneratorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            scheduler: GcScheduler::start(config.generator_gc_grace_period),
        }
    }

    /// Create a state manager for one reconcile of `resource`
    pub fn state_manager<'a, R: HasGeneratorState>(
        &self,
        resource: &'a mut R,
        client: Client,
        namespace: impl Into<String>,
    ) -> StateManager<'a, R> {
        StateManager::new(
            resource,
            client,
            namespace,
            Arc::clone(&self.registry),
            self.scheduler.clone(),
        )
    }
}
