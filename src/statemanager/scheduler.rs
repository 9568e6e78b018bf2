//! # GC Scheduler
//!
//! Process-wide, best-effort trigger that fires a single cleanup attempt for a
//! generated artifact once its grace period has elapsed.
//!
//! Scheduled jobs never touch a ledger. Whether a job succeeds or fails, the
//! `GC` entry stays until a reconcile-driven sweep removes it, so the two
//! paths may both clean the same artifact. Generator cleanup is idempotent.
//!
//! One scheduler is started at process entry and handed to every state
//! manager; clones share the same background dispatcher.

use crate::constants::GC_SCHEDULER_QUEUE_CAPACITY;
use crate::generator::{cleanup_idempotent, Generator, GeneratorError, GeneratorTag};
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use kube::Client;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("GC scheduler queue is full")]
    QueueFull,
    #[error("GC scheduler is not running")]
    Stopped,
}

/// Derive the content key of a `GC` ledger entry
///
/// `"[" + key + "]-" + hex(providerState ++ sha256(resourceSpec))`, using the
/// compact JSON encoding of each blob. A missing provider state contributes no
/// bytes. Flagging the same (key, spec, state) twice lands in the same slot.
#[must_use]
pub fn gc_key(
    state_key: &str,
    resource_spec: &serde_json::Value,
    provider_state: Option<&serde_json::Value>,
) -> String {
    let spec_hash = Sha256::digest(resource_spec.to_string().as_bytes());

    let mut bytes = provider_state
        .map(|state| state.to_string().into_bytes())
        .unwrap_or_default();
    bytes.extend_from_slice(&spec_hash);

    let mut key = format!("[{state_key}]-");
    for byte in &bytes {
        let _ = write!(key, "{byte:02x}");
    }
    key
}

/// An artifact flagged for garbage collection together with its generator
#[derive(Clone)]
pub struct GcEntry {
    /// Caller key the artifact was generated under
    pub state_key: String,
    pub generator: Arc<dyn Generator>,
    pub resource_spec: serde_json::Value,
    pub provider_state: Option<serde_json::Value>,
}

impl std::fmt::Debug for GcEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcEntry")
            .field("state_key", &self.state_key)
            .field("resource_spec", &self.resource_spec)
            .field("provider_state", &self.provider_state)
            .finish_non_exhaustive()
    }
}

impl GcEntry {
    /// Content-derived ledger key, see [`gc_key`]
    #[must_use]
    pub fn key(&self) -> String {
        gc_key(
            &self.state_key,
            &self.resource_spec,
            self.provider_state.as_ref(),
        )
    }

    fn generator_kind(&self) -> String {
        GeneratorTag::from_resource_spec(&self.resource_spec)
            .map_or_else(|_| "unknown".to_string(), |tag| tag.kind)
    }
}

struct ScheduledJob {
    entry: GcEntry,
    client: Client,
    namespace: String,
    due: Instant,
}

struct SchedulerInner {
    grace_period: Duration,
    jobs: mpsc::Sender<ScheduledJob>,
}

/// Handle to the process-wide GC scheduler
#[derive(Clone)]
pub struct GcScheduler {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for GcScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcScheduler")
            .field("grace_period", &self.inner.grace_period)
            .finish_non_exhaustive()
    }
}

impl GcScheduler {
    /// Start the background dispatcher and return a handle to it
    ///
    /// Must be called from within a Tokio runtime. The dispatcher runs until
    /// every handle has been dropped and all pending jobs have fired.
    #[must_use]
    pub fn start(grace_period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(GC_SCHEDULER_QUEUE_CAPACITY);
        tokio::spawn(dispatch(rx));
        info!(
            "GC scheduler started (grace period: {}s)",
            grace_period.as_secs()
        );
        Self {
            inner: Arc::new(SchedulerInner {
                grace_period,
                jobs: tx,
            }),
        }
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.inner.grace_period
    }

    /// Schedule exactly one cleanup attempt for `entry` after the grace period
    pub fn enqueue(
        &self,
        entry: GcEntry,
        client: Client,
        namespace: &str,
    ) -> Result<(), SchedulerError> {
        let key = entry.key();
        let job = ScheduledJob {
            entry,
            client,
            namespace: namespace.to_string(),
            due: Instant::now() + self.inner.grace_period,
        };
        match self.inner.jobs.try_send(job) {
            Ok(()) => {
                metrics::increment_gc_scheduled();
                debug!(
                    "Scheduled cleanup of {} in {}s",
                    key,
                    self.inner.grace_period.as_secs()
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(SchedulerError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SchedulerError::Stopped),
        }
    }

    /// Attempt cleanup of an entry flagged at `flagged_at` if its grace period has elapsed
    ///
    /// Returns `Ok(false)` when the entry is not yet due. That is not a failure.
    pub async fn cleanup(
        &self,
        flagged_at: DateTime<Utc>,
        entry: &GcEntry,
        client: &Client,
        namespace: &str,
    ) -> Result<bool, GeneratorError> {
        if !self.is_due(flagged_at, Utc::now()) {
            return Ok(false);
        }
        cleanup_entry(&entry.key(), entry, client, namespace).await?;
        Ok(true)
    }

    /// Whether an entry flagged at `flagged_at` may be cleaned at `now`
    #[must_use]
    pub fn is_due(&self, flagged_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(self.inner.grace_period)
            .ok()
            .and_then(|grace| flagged_at.checked_add_signed(grace))
            .is_some_and(|due| due <= now)
    }
}

/// Run one cleanup for `entry` inside a span, folding not-found into success
pub(crate) async fn cleanup_entry(
    key: &str,
    entry: &GcEntry,
    client: &Client,
    namespace: &str,
) -> Result<(), GeneratorError> {
    let span = tracing::info_span!(
        "generator.gc.cleanup",
        gc.key = %key,
        generator.kind = %entry.generator_kind(),
        namespace = %namespace
    );
    cleanup_idempotent(
        entry.generator.as_ref(),
        &entry.resource_spec,
        entry.provider_state.as_ref(),
        client,
        namespace,
    )
    .instrument(span)
    .await
}

async fn dispatch(mut rx: mpsc::Receiver<ScheduledJob>) {
    let mut running = JoinSet::new();
    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    running.spawn(run_job(job));
                }
                None => break,
            },
            Some(finished) = running.join_next(), if !running.is_empty() => {
                if let Err(e) = finished {
                    warn!("Scheduled GC job did not complete: {}", e);
                }
            }
        }
    }
    while let Some(finished) = running.join_next().await {
        if let Err(e) = finished {
            warn!("Scheduled GC job did not complete: {}", e);
        }
    }
    debug!("GC scheduler dispatcher stopped");
}

async fn run_job(job: ScheduledJob) {
    tokio::time::sleep_until(job.due).await;
    let key = job.entry.key();
    match cleanup_entry(&key, &job.entry, &job.client, &job.namespace).await {
        Ok(()) => {
            metrics::increment_gc_cleanups("scheduler");
            info!("Best-effort cleanup of {} succeeded", key);
        }
        Err(e) => {
            // The ledger entry stays; the next sweep retries.
            metrics::increment_gc_cleanup_errors("scheduler");
            warn!("Best-effort cleanup of {} failed: {}", key, e);
        }
    }
}
