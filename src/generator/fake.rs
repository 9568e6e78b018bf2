//! Fake generator: returns static data, creates nothing remotely.

use crate::crd::Fake;
use crate::generator::{Generator, GeneratorError, GeneratorOutput};
use async_trait::async_trait;
use kube::Client;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, Default)]
pub struct FakeGenerator;

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(
        &self,
        spec: &serde_json::Value,
        _client: &Client,
        _namespace: &str,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let fake: Fake = serde::Deserialize::deserialize(spec)?;
        let data = fake
            .spec
            .data
            .into_iter()
            .map(|(k, v)| (k, Zeroizing::new(v.into_bytes())))
            .collect();
        Ok(GeneratorOutput { data, state: None })
    }

    async fn cleanup(
        &self,
        _spec: &serde_json::Value,
        _state: Option<&serde_json::Value>,
        _client: &Client,
        _namespace: &str,
    ) -> Result<(), GeneratorError> {
        Ok(())
    }
}
