//! UUID generator: random v4 UUID, stateless.

use crate::generator::{Generator, GeneratorError, GeneratorOutput};
use async_trait::async_trait;
use kube::Client;
use std::collections::BTreeMap;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

#[async_trait]
impl Generator for UuidGenerator {
    async fn generate(
        &self,
        _spec: &serde_json::Value,
        _client: &Client,
        _namespace: &str,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let id = ::uuid::Uuid::new_v4().to_string();
        let mut data = BTreeMap::new();
        data.insert("uuid".to_string(), Zeroizing::new(id.into_bytes()));
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
