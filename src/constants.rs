//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default grace period an artifact waits in `GC` before cleanup is attempted (seconds)
pub const DEFAULT_GENERATOR_GC_GRACE_PERIOD_SECS: u64 = 120;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Environment variable holding the GC grace period as a Kubernetes duration
pub const ENV_GENERATOR_GC_GRACE_PERIOD: &str = "GENERATOR_GC_GRACE_PERIOD";

/// Capacity of the scheduler's job channel before `enqueue` starts dropping jobs
pub const GC_SCHEDULER_QUEUE_CAPACITY: usize = 1024;
