//! # Garbage Collection Tests
//!
//! Grace-period gating, retention on failure, and immediate teardown.

mod common;

use chrono::{DateTime, Utc};
use common::{mock_spec, test_client, MockGenerators, TestResource};
use secret_generator_controller::crd::GeneratorGcState;
use secret_generator_controller::statemanager::{
    cleanup_immediate, garbage_collect, GcScheduler, StateError,
};
use serde_json::{json, Value};
use std::time::Duration;

const GRACE: Duration = Duration::from_secs(120);

fn flag(resource: &mut TestResource, key: &str, spec: Value, flagged_at: DateTime<Utc>) {
    resource.status.gc.insert(
        key.to_string(),
        GeneratorGcState {
            resource_spec: spec,
            provider_state: Some(json!({"id": key})),
            flagged_at,
        },
    );
}

fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::minutes(minutes)
}

#[tokio::test]
async fn test_sweep_only_cleans_due_entries() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    let fresh_flagged_at = Utc::now();
    flag(&mut resource, "[fresh]-01", mock_spec("Mock", "fresh"), fresh_flagged_at);
    flag(&mut resource, "[stale]-02", mock_spec("Mock", "stale"), minutes_ago(10));

    garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap();

    assert_eq!(mocks.ok.cleaned_states(), vec![Some(json!({"id": "[stale]-02"}))]);
    assert_eq!(resource.status.gc.len(), 1);
    let fresh = &resource.status.gc["[fresh]-01"];
    assert_eq!(fresh.flagged_at, fresh_flagged_at);
    assert_eq!(fresh.resource_spec, mock_spec("Mock", "fresh"));
}

#[tokio::test]
async fn test_sweep_cleans_entry_exactly_at_boundary() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    flag(
        &mut resource,
        "[edge]-01",
        mock_spec("Mock", "edge"),
        Utc::now() - chrono::Duration::seconds(120),
    );

    garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap();

    assert_eq!(mocks.ok.cleanup_count(), 1);
    assert!(resource.status.gc.is_empty());
}

#[tokio::test]
async fn test_sweep_retains_failed_cleanups_and_keeps_going() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    flag(&mut resource, "[a]-01", mock_spec("Mock", "a"), minutes_ago(5));
    flag(&mut resource, "[b]-02", mock_spec("Failing", "b"), minutes_ago(5));
    flag(&mut resource, "[c]-03", mock_spec("Mock", "c"), minutes_ago(5));

    let err = garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].key(), "[b]-02");
    assert!(matches!(err.errors()[0], StateError::Cleanup { .. }));
    assert_eq!(mocks.ok.cleanup_count(), 2);
    assert_eq!(mocks.failing.cleanup_count(), 1);

    // The failed entry waits for the next sweep with its original timestamp.
    assert_eq!(resource.status.gc.len(), 1);
    assert!(resource.status.gc.contains_key("[b]-02"));
}

#[tokio::test]
async fn test_sweep_treats_not_found_as_cleaned() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    flag(&mut resource, "[gone]-01", mock_spec("Gone", "gone"), minutes_ago(5));

    garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap();

    assert_eq!(mocks.gone.cleanup_count(), 1);
    assert!(resource.status.gc.is_empty());
}

#[tokio::test]
async fn test_sweep_retains_unresolvable_entries() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    flag(&mut resource, "[x]-01", mock_spec("Unregistered", "x"), minutes_ago(5));

    let err = garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap_err();

    assert!(matches!(err.errors()[0], StateError::Resolve { .. }));
    assert!(resource.status.gc.contains_key("[x]-01"));
}

#[tokio::test]
async fn test_sweep_keeps_unresolvable_entries_quietly_until_due() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    flag(&mut resource, "[x]-01", mock_spec("Unregistered", "x"), Utc::now());

    garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap();

    assert!(resource.status.gc.contains_key("[x]-01"));
}

#[tokio::test]
async fn test_sweep_leaves_latest_alone() {
    let mocks = MockGenerators::new();
    let scheduler = GcScheduler::start(GRACE);
    let mut resource = TestResource::default();
    resource.status.latest.insert(
        "db-token".to_string(),
        secret_generator_controller::crd::GeneratorResourceState {
            resource_spec: mock_spec("Mock", "active"),
            provider_state: None,
        },
    );

    garbage_collect(
        &mut resource,
        &mocks.registry,
        &scheduler,
        &test_client(),
        "default",
    )
    .await
    .unwrap();

    assert_eq!(resource.status.latest.len(), 1);
    assert_eq!(mocks.ok.cleanup_count(), 0);
}

#[tokio::test]
async fn test_cleanup_immediate_ignores_grace_and_reports_only_failures() {
    let mocks = MockGenerators::new();
    let mut resource = TestResource::default();
    flag(&mut resource, "[ok]-01", mock_spec("Mock", "ok"), Utc::now());
    flag(&mut resource, "[bad]-02", mock_spec("Failing", "bad"), Utc::now());

    let err = cleanup_immediate(&mut resource, &mocks.registry, &test_client(), "default")
        .await
        .unwrap_err();

    assert_eq!(mocks.ok.cleanup_count(), 1);
    assert_eq!(mocks.failing.cleanup_count(), 1);
    assert_eq!(err.len(), 1);
    let rendered = err.to_string();
    assert!(rendered.contains("[bad]-02"));
    assert!(!rendered.contains("[ok]-01"));

    assert!(!resource.status.gc.contains_key("[ok]-01"));
    assert!(resource.status.gc.contains_key("[bad]-02"));
}

#[tokio::test]
async fn test_manager_garbage_collect_uses_bound_context() {
    let mocks = MockGenerators::new();
    let mut resource = TestResource::default();
    flag(&mut resource, "[stale]-01", mock_spec("Mock", "stale"), minutes_ago(10));
    {
        let mut manager = secret_generator_controller::statemanager::StateManager::new(
            &mut resource,
            test_client(),
            "default",
            mocks.registry.clone(),
            GcScheduler::start(GRACE),
        );
        manager.garbage_collect().await.unwrap();
    }
    assert!(resource.status.gc.is_empty());
    assert_eq!(mocks.ok.cleanup_count(), 1);
}
