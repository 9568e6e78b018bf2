//! # Initialization
//!
//! Controller initialization logic including rustls setup, metrics,
//! generator runtime, Kubernetes client, and server startup.

use crate::config::ControllerConfig;
use crate::generator::GeneratorRegistry;
use crate::observability;
use crate::runtime::GeneratorRuntime;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use kube::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Generator registry and GC scheduler
    pub runtime: GeneratorRuntime,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("runtime", &self.runtime)
            .field(
                "server_ready",
                &self.server_state.is_ready.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

/// Install the ring crypto provider for rustls
///
/// Required for rustls 0.23+ before any TLS connection is made. Installing
/// twice is harmless.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }
}

/// Initialize the generator runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Metrics registration
/// - HTTP server startup
/// - GC scheduler startup and generator registry population
/// - Kubernetes client creation
pub async fn initialize(config: &ControllerConfig) -> Result<InitializationResult> {
    install_crypto_provider();

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(AtomicBool::new(false)),
    });
    let server_state_clone = Arc::clone(&server_state);
    let port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let registry = GeneratorRegistry::with_builtin();
    info!("Registered {} generator implementations", registry.len());
    let runtime = GeneratorRuntime::start(config, registry);

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    server_state.is_ready.store(true, Ordering::Relaxed);
    info!("Generator runtime ready");

    Ok(InitializationResult {
        client,
        runtime,
        server_state,
    })
}
