//! # Generator Registry
//!
//! Resolves the generator implementation for a serialized generator resource.
//!
//! Ledger entries outlive the reconcile that created them, so a GC sweep has
//! only the stored `resourceSpec` to go on. The registry is populated once at
//! startup and looked up by the `apiVersion`/`kind` embedded in that blob.

use crate::generator::{FakeGenerator, Generator, UuidGenerator};
use kube::core::TypeMeta;
use kube::Resource;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Generator resource spec has no apiVersion/kind: {0}")]
    MissingTypeMeta(#[source] serde_json::Error),
    #[error("No generator registered for {0}")]
    UnknownGenerator(GeneratorTag),
}

/// Stable identity of a generator implementation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratorTag {
    pub api_version: String,
    pub kind: String,
}

impl GeneratorTag {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Tag of a statically typed generator resource
    #[must_use]
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self::new(K::api_version(&()), K::kind(&()))
    }

    /// Read the tag embedded in a serialized generator resource
    pub fn from_resource_spec(spec: &serde_json::Value) -> Result<Self, RegistryError> {
        let type_meta = TypeMeta::deserialize(spec).map_err(RegistryError::MissingTypeMeta)?;
        Ok(Self::new(type_meta.api_version, type_meta.kind))
    }
}

impl std::fmt::Display for GeneratorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_version, self.kind)
    }
}

/// Registry of generator implementations keyed by tag
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<GeneratorTag, Arc<dyn Generator>>,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GeneratorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the generators shipped in this crate
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<crate::crd::Fake>(Arc::new(FakeGenerator));
        registry.register::<crate::crd::Uuid>(Arc::new(UuidGenerator));
        registry
    }

    /// Register the implementation for a statically typed generator resource
    pub fn register<K: Resource<DynamicType = ()>>(&mut self, generator: Arc<dyn Generator>) {
        self.register_tag(GeneratorTag::of::<K>(), generator);
    }

    /// Register an implementation under an explicit tag, replacing any previous one
    pub fn register_tag(&mut self, tag: GeneratorTag, generator: Arc<dyn Generator>) {
        if self.generators.insert(tag.clone(), generator).is_some() {
            tracing::warn!("Replacing generator registered for {}", tag);
        }
    }

    /// Resolve the implementation for a serialized generator resource
    pub fn resolve(&self, spec: &serde_json::Value) -> Result<Arc<dyn Generator>, RegistryError> {
        let tag = GeneratorTag::from_resource_spec(spec)?;
        self.generators
            .get(&tag)
            .cloned()
            .ok_or(RegistryError::UnknownGenerator(tag))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
