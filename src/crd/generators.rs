//! # Built-in Generator Resources
//!
//! Custom resources describing the generators shipped with the controller.
//! Their serialized form is what ends up in a ledger entry's `resourceSpec`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fake generator
///
/// Returns the static key/value pairs from `spec.data`. Useful for testing
/// secret pipelines without touching a remote system.
///
/// # Example
///
/// ```yaml
/// apiVersion: generators.external-secrets.io/v1alpha1
/// kind: Fake
/// metadata:
///   name: static-credentials
/// spec:
///   data:
///     username: admin
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Fake",
    group = "generators.external-secrets.io",
    version = "v1alpha1",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct FakeSpec {
    /// Static data returned on every generate call
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// UUID generator
///
/// Produces a random v4 UUID under the `uuid` key.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "UUID",
    root = "Uuid",
    group = "generators.external-secrets.io",
    version = "v1alpha1",
    namespaced
)]
pub struct UuidSpec {}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::CustomResourceExt;
    use kube::Resource;

    #[test]
    fn test_uuid_root_type_keeps_upper_case_kind() {
        let crd = Uuid::crd();
        assert_eq!(crd.spec.names.kind, "UUID");
        assert_eq!(crd.spec.group, "generators.external-secrets.io");
        assert_eq!(Uuid::api_version(&()), "generators.external-secrets.io/v1alpha1");
    }
}
