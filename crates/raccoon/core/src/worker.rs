//! The eviction worker.
//!
//! A single long-lived task takes one workload at a time from the hand-off,
//! evicts it (or logs the intent in dry-run mode) and then sleeps a jittered
//! delay before accepting the next one. Being the only consumer, it is the
//! only place where this daemon mutates the cluster, so evictions are never
//! concurrent.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::directory::WorkloadDirectory;
use crate::handoff::HandoffReceiver;
use crate::metrics::{EvictionObserver, NoopObserver};
use crate::pacing::PacingPolicy;
use crate::workload::WorkloadRef;

/// Result of processing one workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionOutcome {
    /// Dry-run: nothing was sent to the directory.
    DryRun,
    /// The directory accepted the eviction.
    Evicted,
    /// The directory rejected or failed the eviction.
    Failed,
    /// Cancellation fired while the eviction was in flight.
    Cancelled,
}

/// Evict one workload. Never fails: errors are logged and reported as
/// [`EvictionOutcome::Failed`].
pub async fn process_eviction(
    dry_run: bool,
    directory: &dyn WorkloadDirectory,
    observer: &dyn EvictionObserver,
    target: &WorkloadRef,
    cancel: &CancellationToken,
) -> EvictionOutcome {
    debug!(pod = %target.name, namespace = %target.namespace, "new pod to collect");

    if dry_run {
        info!(pod = %target.name, namespace = %target.namespace, "dry-run, pod would have been evicted");
        return EvictionOutcome::DryRun;
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return EvictionOutcome::Cancelled,
        result = directory.evict(&target.namespace, &target.name) => result,
    };

    match result {
        Ok(()) => {
            observer.workload_evicted(&target.namespace);
            info!(pod = %target.name, namespace = %target.namespace, "pod evicted");
            EvictionOutcome::Evicted
        }
        Err(e) => {
            error!(pod = %target.name, namespace = %target.namespace, error = %e, "error while evicting pod");
            EvictionOutcome::Failed
        }
    }
}

/// Consumer side of the hand-off.
pub struct EvictionWorker {
    receiver: HandoffReceiver<WorkloadRef>,
    directory: Arc<dyn WorkloadDirectory>,
    observer: Arc<dyn EvictionObserver>,
    pacing: PacingPolicy,
    rng: StdRng,
    dry_run: bool,
    cancel: CancellationToken,
}

impl EvictionWorker {
    /// Create a worker with no pacing, no metrics and an entropy-seeded
    /// generator.
    pub fn new(
        receiver: HandoffReceiver<WorkloadRef>,
        directory: Arc<dyn WorkloadDirectory>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            directory,
            observer: Arc::new(NoopObserver),
            pacing: PacingPolicy::from_secs(0),
            rng: StdRng::from_entropy(),
            dry_run: false,
            cancel,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn EvictionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the worker on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Consume workloads until cancellation.
    pub async fn run(mut self) {
        debug!(max_delay_secs = self.pacing.max_delay().as_secs(), dry_run = self.dry_run, "eviction worker started");

        while let Some(target) = self.receiver.recv(&self.cancel).await {
            process_eviction(
                self.dry_run,
                self.directory.as_ref(),
                self.observer.as_ref(),
                &target,
                &self.cancel,
            )
            .await;

            let delay = self.pacing.sample(&mut self.rng);
            debug!(delay_ms = delay.as_millis() as u64, "waiting randomized delay");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        debug!("eviction worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff;
    use crate::memory::InMemoryDirectory;
    use crate::metrics::EvictionMetrics;
    use chrono::Utc;
    use prometheus::Registry;
    use std::time::Duration;

    use crate::workload::Workload;

    fn directory_with(pods: &[(&str, &str)]) -> InMemoryDirectory {
        InMemoryDirectory::with_workloads(
            pods.iter()
                .map(|(ns, name)| Workload::new(*ns, *name, Utc::now())),
        )
    }

    #[tokio::test]
    async fn test_dry_run_activated() {
        let directory = directory_with(&[("namespace-1", "pod-1")]);
        let metrics = EvictionMetrics::new(&Registry::new()).unwrap();
        let target = WorkloadRef::new("namespace-1", "pod-1");

        let outcome = process_eviction(true, &directory, &metrics, &target, &CancellationToken::new()).await;

        assert_eq!(outcome, EvictionOutcome::DryRun);
        assert!(directory.evictions().await.is_empty());
        assert_eq!(metrics.deleted_in("namespace-1"), 0);
    }

    #[tokio::test]
    async fn test_dry_run_deactivated() {
        let directory = directory_with(&[("namespace-1", "pod-2")]);
        let metrics = EvictionMetrics::new(&Registry::new()).unwrap();
        let target = WorkloadRef::new("namespace-1", "pod-2");

        let outcome = process_eviction(false, &directory, &metrics, &target, &CancellationToken::new()).await;

        assert_eq!(outcome, EvictionOutcome::Evicted);
        assert_eq!(directory.evictions().await, vec![target]);
        assert_eq!(metrics.deleted_in("namespace-1"), 1);
    }

    #[tokio::test]
    async fn test_failed_eviction_is_not_counted() {
        let directory = directory_with(&[("namespace-1", "pod-3")]);
        let target = WorkloadRef::new("namespace-1", "pod-3");
        directory.fail_eviction_of(target.clone()).await;
        let metrics = EvictionMetrics::new(&Registry::new()).unwrap();

        let outcome = process_eviction(false, &directory, &metrics, &target, &CancellationToken::new()).await;

        assert_eq!(outcome, EvictionOutcome::Failed);
        assert_eq!(metrics.deleted_in("namespace-1"), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_eviction() {
        let directory = directory_with(&[("namespace-1", "pod-4")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let target = WorkloadRef::new("namespace-1", "pod-4");
        let outcome = process_eviction(false, &directory, &NoopObserver, &target, &cancel).await;

        assert_eq!(outcome, EvictionOutcome::Cancelled);
        assert!(directory.evictions().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_continues_after_failure() {
        let directory = directory_with(&[("ns", "a"), ("ns", "b")]);
        directory.fail_eviction_of(WorkloadRef::new("ns", "a")).await;
        let cancel = CancellationToken::new();
        let (mut tx, rx) = handoff::channel();

        let worker = EvictionWorker::new(rx, Arc::new(directory.clone()), cancel.clone())
            .with_pacing(PacingPolicy::from_secs(120))
            .with_rng(StdRng::seed_from_u64(3))
            .spawn();

        tx.send(WorkloadRef::new("ns", "a"), &cancel).await.unwrap();
        tx.send(WorkloadRef::new("ns", "b"), &cancel).await.unwrap();
        // The second send returns once "b" is taken; let the eviction land.
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(directory.evictions().await, vec![WorkloadRef::new("ns", "b")]);

        cancel.cancel();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_separates_evictions() {
        let directory = directory_with(&[("ns", "a"), ("ns", "b")]);
        let cancel = CancellationToken::new();
        let (mut tx, rx) = handoff::channel();

        let worker = EvictionWorker::new(rx, Arc::new(directory.clone()), cancel.clone())
            .with_pacing(PacingPolicy::from_secs(100))
            .with_rng(StdRng::seed_from_u64(11))
            .spawn();

        let start = tokio::time::Instant::now();
        tx.send(WorkloadRef::new("ns", "a"), &cancel).await.unwrap();
        tx.send(WorkloadRef::new("ns", "b"), &cancel).await.unwrap();
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(50), "second hand-off after {waited:?}");
        assert!(waited <= Duration::from_secs(101), "second hand-off after {waited:?}");

        cancel.cancel();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pacing_sleep() {
        let directory = directory_with(&[("ns", "a")]);
        let cancel = CancellationToken::new();
        let (mut tx, rx) = handoff::channel();

        let worker = EvictionWorker::new(rx, Arc::new(directory.clone()), cancel.clone())
            .with_pacing(PacingPolicy::from_secs(3600))
            .spawn();

        tx.send(WorkloadRef::new("ns", "a"), &cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker did not stop while pacing")
            .unwrap();
        assert_eq!(directory.evictions().await.len(), 1);
    }
}
