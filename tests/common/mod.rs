//! Common test utilities for generator state tests
//!
//! Provides a recording mock generator, an in-memory owning resource, and a
//! Kubernetes client that is never actually contacted.

#![allow(dead_code)]

use async_trait::async_trait;
use kube::Client;
use secret_generator_controller::crd::{GeneratorLedger, HasGeneratorState};
use secret_generator_controller::generator::{
    Generator, GeneratorError, GeneratorOutput, GeneratorRegistry, GeneratorTag,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Client pointing at an address nothing listens on. Mock generators ignore it.
///
/// Must be called from within a Tokio runtime.
pub fn test_client() -> Client {
    init_rustls();
    let config = kube::Config::new("http://127.0.0.1:9".parse().expect("static url"));
    Client::try_from(config).expect("client from static config")
}

pub const MOCK_API_VERSION: &str = "test.generators.io/v1";

/// Serialized generator resource of the given mock kind
pub fn mock_spec(kind: &str, name: &str) -> Value {
    json!({
        "apiVersion": MOCK_API_VERSION,
        "kind": kind,
        "metadata": {"name": name},
        "spec": {}
    })
}

/// How a mock generator's cleanup behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupBehavior {
    Succeed,
    Fail,
    NotFound,
}

/// Generator that records every cleanup call
#[derive(Debug)]
pub struct MockGenerator {
    behavior: CleanupBehavior,
    generate_calls: AtomicUsize,
    cleanups: Mutex<Vec<Option<Value>>>,
}

impl MockGenerator {
    pub fn new(behavior: CleanupBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            generate_calls: AtomicUsize::new(0),
            cleanups: Mutex::new(Vec::new()),
        })
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.lock().unwrap().len()
    }

    /// Provider states passed to cleanup, in call order
    pub fn cleaned_states(&self) -> Vec<Option<Value>> {
        self.cleanups.lock().unwrap().clone()
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        _spec: &Value,
        _client: &Client,
        _namespace: &str,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let n = self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratorOutput {
            data: Default::default(),
            state: Some(json!({"id": format!("token-{n}")})),
        })
    }

    async fn cleanup(
        &self,
        _spec: &Value,
        state: Option<&Value>,
        _client: &Client,
        _namespace: &str,
    ) -> Result<(), GeneratorError> {
        self.cleanups.lock().unwrap().push(state.cloned());
        match self.behavior {
            CleanupBehavior::Succeed => Ok(()),
            CleanupBehavior::Fail => Err(GeneratorError::Other(anyhow::anyhow!(
                "remote API unavailable"
            ))),
            CleanupBehavior::NotFound => {
                Err(GeneratorError::NotFound("token already revoked".to_string()))
            }
        }
    }
}

/// Registry with one mock generator per behaviour, keyed by kind
pub struct MockGenerators {
    pub ok: Arc<MockGenerator>,
    pub failing: Arc<MockGenerator>,
    pub gone: Arc<MockGenerator>,
    pub registry: Arc<GeneratorRegistry>,
}

impl MockGenerators {
    pub fn new() -> Self {
        let ok = MockGenerator::new(CleanupBehavior::Succeed);
        let failing = MockGenerator::new(CleanupBehavior::Fail);
        let gone = MockGenerator::new(CleanupBehavior::NotFound);

        let mut registry = GeneratorRegistry::new();
        registry.register_tag(GeneratorTag::new(MOCK_API_VERSION, "Mock"), ok.clone());
        registry.register_tag(
            GeneratorTag::new(MOCK_API_VERSION, "Failing"),
            failing.clone(),
        );
        registry.register_tag(GeneratorTag::new(MOCK_API_VERSION, "Gone"), gone.clone());

        Self {
            ok,
            failing,
            gone,
            registry: Arc::new(registry),
        }
    }
}

/// Owning resource that keeps its ledger in memory
#[derive(Debug, Default, Clone)]
pub struct TestResource {
    pub status: GeneratorLedger,
}

impl HasGeneratorState for TestResource {
    fn generator_state(&self) -> GeneratorLedger {
        self.status.clone()
    }

    fn set_generator_state(&mut self, state: GeneratorLedger) {
        self.status = state;
    }
}
