//! # Generators
//!
//! Capability contract implemented by every generator variant.
//!
//! A generator creates an external artifact (`generate`) and destroys it again
//! (`cleanup`) given the provider state it returned. The state manager only
//! ever calls `cleanup`; `generate` is driven by the owning reconciler.
//!
//! - `registry`: maps a generator resource's `apiVersion`/`kind` to its implementation
//! - `fake`, `uuid`: built-in generators

mod fake;
pub mod registry;
mod uuid;

pub use self::fake::FakeGenerator;
pub use registry::{GeneratorRegistry, GeneratorTag, RegistryError};
pub use self::uuid::UuidGenerator;

use async_trait::async_trait;
use kube::Client;
use std::collections::BTreeMap;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors returned by generator implementations
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The artifact no longer exists remotely. Callers treat this as a successful cleanup.
    #[error("Generated resource not found: {0}")]
    NotFound(String),
    #[error("Invalid generator spec: {0}")]
    InvalidSpec(#[from] serde_json::Error),
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GeneratorError {
    /// Whether this error means the artifact is already gone
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            GeneratorError::NotFound(_) => true,
            GeneratorError::Kube(kube::Error::Api(api_err)) => api_err.code == 404,
            _ => false,
        }
    }
}

/// Output of a successful `generate` call
#[derive(Default)]
pub struct GeneratorOutput {
    /// Generated secret material, wiped on drop
    pub data: BTreeMap<String, Zeroizing<Vec<u8>>>,
    /// Generator-defined state needed by `cleanup`. `None` for stateless generators.
    pub state: Option<serde_json::Value>,
}

impl std::fmt::Debug for GeneratorOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorOutput")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}

/// Generator capability contract
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce output data plus the opaque state needed to clean it up later
    ///
    /// May be called repeatedly with the same spec.
    async fn generate(
        &self,
        spec: &serde_json::Value,
        client: &Client,
        namespace: &str,
    ) -> Result<GeneratorOutput, GeneratorError>;

    /// Destroy whatever `generate` created, given the same spec and state
    ///
    /// Must be idempotent. Return `GeneratorError::NotFound` (or a 404 from the
    /// cluster API) when the artifact is already gone.
    async fn cleanup(
        &self,
        spec: &serde_json::Value,
        state: Option<&serde_json::Value>,
        client: &Client,
        namespace: &str,
    ) -> Result<(), GeneratorError>;
}

/// Run `cleanup`, folding not-found outcomes into success
pub async fn cleanup_idempotent(
    generator: &dyn Generator,
    spec: &serde_json::Value,
    state: Option<&serde_json::Value>,
    client: &Client,
    namespace: &str,
) -> Result<(), GeneratorError> {
    match generator.cleanup(spec, state, client, namespace).await {
        Err(e) if e.is_not_found() => {
            tracing::debug!("Generated resource already gone, treating cleanup as done: {}", e);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(GeneratorError::NotFound("token 42".to_string()).is_not_found());
        assert!(!GeneratorError::Other(anyhow::anyhow!("boom")).is_not_found());
    }

    #[test]
    fn test_output_debug_hides_values() {
        let mut output = GeneratorOutput::default();
        output
            .data
            .insert("password".to_string(), Zeroizing::new(b"hunter2".to_vec()));
        let rendered = format!("{output:?}");
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
    }
}
