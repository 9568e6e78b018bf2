//! # Generator Ledger
//!
//! Status types tracking artifacts created by generators on behalf of an
//! owning resource (an ExternalSecret, PushSecret, ...).
//!
//! The ledger holds two independent maps:
//! - `latest`: the artifact currently in use, keyed by the caller's generator reference key
//! - `gc`: superseded artifacts waiting for cleanup, keyed by a content-derived key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A currently active generated artifact
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorResourceState {
    /// Serialized generator resource (apiVersion, kind, metadata, spec) that produced the artifact
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub resource_spec: serde_json::Value,
    /// Generator-defined data needed to destroy the artifact later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub provider_state: Option<serde_json::Value>,
}

/// An artifact that is no longer current and is pending destruction
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorGcState {
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub resource_spec: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub provider_state: Option<serde_json::Value>,
    /// When the artifact entered `gc`. Never updated afterwards.
    #[schemars(schema_with = "date_time")]
    pub flagged_at: DateTime<Utc>,
}

impl GeneratorGcState {
    /// Flag an active artifact for garbage collection at `flagged_at`
    #[must_use]
    pub fn from_resource_state(state: GeneratorResourceState, flagged_at: DateTime<Utc>) -> Self {
        Self {
            resource_spec: state.resource_spec,
            provider_state: state.provider_state,
            flagged_at,
        }
    }
}

/// Generator ledger persisted in an owning resource's status
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorLedger {
    /// Active artifacts, at most one per generator reference key
    #[serde(default)]
    pub latest: BTreeMap<String, GeneratorResourceState>,
    /// Artifacts pending destruction, keyed by content-derived GC key
    #[serde(default)]
    pub gc: BTreeMap<String, GeneratorGcState>,
}

impl GeneratorLedger {
    /// Whether the ledger tracks nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty() && self.gc.is_empty()
    }
}

/// Implemented by every resource that manages generator state
///
/// The state manager works on a copy obtained through `generator_state` and
/// writes it back with `set_generator_state`. Persisting the resource to the
/// cluster afterwards is the caller's job.
pub trait HasGeneratorState {
    fn generator_state(&self) -> GeneratorLedger;

    fn set_generator_state(&mut self, state: GeneratorLedger);
}

fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

fn date_time(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "date-time"
    })
}
