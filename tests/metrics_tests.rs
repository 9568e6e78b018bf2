//! # Metrics Tests
//!
//! Gauge updates driven by GC sweeps. Kept in its own binary so no other
//! sweep moves the process-wide gauge while these run.

mod common;

use chrono::Utc;
use common::{mock_spec, test_client, MockGenerators, TestResource};
use secret_generator_controller::crd::GeneratorGcState;
use secret_generator_controller::observability::metrics;
use secret_generator_controller::statemanager::{cleanup_immediate, garbage_collect, GcScheduler};
use serde_json::json;
use std::time::Duration;

fn flag(resource: &mut TestResource, key: &str, kind: &str, age_minutes: i64) {
    resource.status.gc.insert(
        key.to_string(),
        GeneratorGcState {
            resource_spec: mock_spec(kind, key),
            provider_state: Some(json!({"id": key})),
            flagged_at: Utc::now() - chrono::Duration::minutes(age_minutes),
        },
    );
}

#[tokio::test]
async fn test_sweeps_publish_retained_entry_count() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(Duration::from_secs(120));
    let mut resource = TestResource::default();
    flag(&mut resource, "[due]-01", "Mock", 10);
    flag(&mut resource, "[fresh]-02", "Mock", 0);
    flag(&mut resource, "[broken]-03", "Failing", 10);

    let _ = garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await;
    assert_eq!(resource.status.gc.len(), 2);
    assert_eq!(metrics::gc_entries_pending(), 2);

    let mut clean = TestResource::default();
    flag(&mut clean, "[ok]-01", "Mock", 0);
    cleanup_immediate(&mut clean, &mocks.registry, &test_client(), "default")
        .await
        .unwrap();
    assert_eq!(metrics::gc_entries_pending(), 0);
}
