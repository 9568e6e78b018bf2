//! # Metrics
//!
//! Prometheus metrics for generator state garbage collection.
//!
//! ## Metrics Exposed
//!
//! - `generator_gc_cleanups_total{source}` - Successful cleanups by path (sweep, immediate, scheduler, rollback)
//! - `generator_gc_cleanup_errors_total{source}` - Failed cleanups by path
//! - `generator_gc_scheduled_total` - Best-effort cleanups handed to the scheduler
//! - `generator_gc_entries_pending` - `GC` entries left in the ledger by the most recent sweep
//! - `generator_rollback_absorbed_total` - Rollback cleanups that failed and were filed into GC

use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static GC_CLEANUPS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "generator_gc_cleanups_total",
            "Total number of successful generated resource cleanups",
        ),
        &["source"],
    )
    .expect("Failed to create GC_CLEANUPS_TOTAL metric - this should never happen")
});

static GC_CLEANUP_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "generator_gc_cleanup_errors_total",
            "Total number of failed generated resource cleanups",
        ),
        &["source"],
    )
    .expect("Failed to create GC_CLEANUP_ERRORS_TOTAL metric - this should never happen")
});

static GC_SCHEDULED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "generator_gc_scheduled_total",
        "Total number of best-effort cleanups scheduled",
    )
    .expect("Failed to create GC_SCHEDULED_TOTAL metric - this should never happen")
});

static GC_ENTRIES_PENDING: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "generator_gc_entries_pending",
        "Number of GC ledger entries retained by the most recent sweep",
    )
    .expect("Failed to create GC_ENTRIES_PENDING metric - this should never happen")
});

static ROLLBACK_ABSORBED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "generator_rollback_absorbed_total",
        "Total number of rollback cleanups that failed and were filed into GC",
    )
    .expect("Failed to create ROLLBACK_ABSORBED_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(GC_CLEANUPS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GC_CLEANUP_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GC_SCHEDULED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GC_ENTRIES_PENDING.clone()))?;
    REGISTRY.register(Box::new(ROLLBACK_ABSORBED_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_gc_cleanups(source: &str) {
    GC_CLEANUPS_TOTAL.with_label_values(&[source]).inc();
}

pub fn increment_gc_cleanup_errors(source: &str) {
    GC_CLEANUP_ERRORS_TOTAL.with_label_values(&[source]).inc();
}

pub fn increment_gc_scheduled() {
    GC_SCHEDULED_TOTAL.inc();
}

pub fn set_gc_entries_pending(count: usize) {
    GC_ENTRIES_PENDING.set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Current value of `generator_gc_entries_pending`
#[must_use]
pub fn gc_entries_pending() -> i64 {
    GC_ENTRIES_PENDING.get()
}

pub fn increment_rollback_absorbed() {
    ROLLBACK_ABSORBED_TOTAL.inc();
}

/// Gather all registered metric families
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}
