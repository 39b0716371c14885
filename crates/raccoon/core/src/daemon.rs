//! Daemon loop driving discovery passes on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::directory::WorkloadDirectory;
use crate::discovery::DiscoveryPass;
use crate::error::RaccoonResult;
use crate::handoff::{self, HandoffSender};
use crate::metrics::EvictionObserver;
use crate::pacing::PacingPolicy;
use crate::ttl::DEFAULT_TTL_ANNOTATION;
use crate::worker::EvictionWorker;
use crate::workload::WorkloadRef;

/// Selection and eviction settings, fixed for the daemon's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Namespace to watch; empty for all namespaces.
    pub namespace: String,

    /// Label selector workloads must match.
    pub selector: String,

    /// TTL applied when a workload carries no override.
    pub default_ttl: Duration,

    /// Log instead of evicting.
    pub dry_run: bool,

    /// Annotation carrying per-workload TTL overrides.
    pub ttl_annotation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            selector: "backmarket.com/raccoon=true".to_string(),
            default_ttl: Duration::from_secs(24 * 60 * 60),
            dry_run: false,
            ttl_annotation: DEFAULT_TTL_ANNOTATION.to_string(),
        }
    }
}

/// Owns the discovery side and supervises the eviction worker.
pub struct Daemon {
    pass: DiscoveryPass,
    directory: Arc<dyn WorkloadDirectory>,
    sender: HandoffSender<WorkloadRef>,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Daemon {
    /// Build the daemon and start its eviction worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        settings: Settings,
        pacing: PacingPolicy,
        directory: Arc<dyn WorkloadDirectory>,
        observer: Arc<dyn EvictionObserver>,
        cancel: CancellationToken,
    ) -> Self {
        Self::build(settings, pacing, directory, observer, cancel, None)
    }

    /// Same as [`Daemon::new`] with a caller-provided random source for pacing.
    pub fn with_rng(
        settings: Settings,
        pacing: PacingPolicy,
        directory: Arc<dyn WorkloadDirectory>,
        observer: Arc<dyn EvictionObserver>,
        cancel: CancellationToken,
        rng: StdRng,
    ) -> Self {
        Self::build(settings, pacing, directory, observer, cancel, Some(rng))
    }

    fn build(
        settings: Settings,
        pacing: PacingPolicy,
        directory: Arc<dyn WorkloadDirectory>,
        observer: Arc<dyn EvictionObserver>,
        cancel: CancellationToken,
        rng: Option<StdRng>,
    ) -> Self {
        let (sender, receiver) = handoff::channel();

        let mut worker = EvictionWorker::new(receiver, directory.clone(), cancel.clone())
            .with_observer(observer)
            .with_pacing(pacing)
            .dry_run(settings.dry_run);
        if let Some(rng) = rng {
            worker = worker.with_rng(rng);
        }

        Self {
            pass: DiscoveryPass::new(&settings),
            directory,
            sender,
            worker: worker.spawn(),
            cancel,
        }
    }

    /// Token shared by every blocking operation of the daemon.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one discovery pass per interval until cancellation.
    ///
    /// Returns `Ok(())` once cancelled. A discovery error stops the loop and
    /// is returned; the eviction worker keeps running until
    /// [`Daemon::shutdown`].
    pub async fn run(&mut self, interval: Duration) -> RaccoonResult<()> {
        info!(interval_secs = interval.as_secs(), "raccoon daemon started");

        loop {
            debug!("raccoon, wake up");
            self.pass
                .run(self.directory.as_ref(), &mut self.sender, &self.cancel)
                .await?;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("raccoon, stop");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Cancel everything and wait for the eviction worker to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "eviction worker terminated abnormally");
        }
        info!("raccoon daemon stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaccoonError;
    use crate::memory::InMemoryDirectory;
    use crate::metrics::NoopObserver;
    use crate::workload::Workload;
    use chrono::Utc;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.namespace.is_empty());
        assert_eq!(settings.selector, "backmarket.com/raccoon=true");
        assert_eq!(settings.default_ttl, Duration::from_secs(86_400));
        assert!(!settings.dry_run);
    }

    #[tokio::test]
    async fn test_discovery_error_stops_loop() {
        let directory = InMemoryDirectory::new();
        directory.fail_listing("forbidden").await;

        let mut daemon = Daemon::new(
            Settings::default(),
            PacingPolicy::from_secs(0),
            Arc::new(directory),
            Arc::new(NoopObserver),
            CancellationToken::new(),
        );

        let err = daemon.run(Duration::from_secs(120)).await.unwrap_err();
        assert!(matches!(err, RaccoonError::DiscoveryFailed { .. }));

        // The worker is still alive until shutdown.
        assert!(!daemon.worker.is_finished());
        daemon.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_cancelled() {
        let directory = InMemoryDirectory::new();
        let cancel = CancellationToken::new();
        let mut daemon = Daemon::new(
            Settings::default(),
            PacingPolicy::from_secs(0),
            Arc::new(directory.clone()),
            Arc::new(NoopObserver),
            cancel,
        );

        let trigger = daemon.cancellation();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(250)).await;
            trigger.cancel();
        });

        daemon.run(Duration::from_secs(120)).await.unwrap();
        daemon.shutdown().await;

        // Passes at t=0, 120 and 240.
        assert_eq!(directory.list_calls().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicted_workload_is_not_rediscovered() {
        let directory = InMemoryDirectory::with_workloads([Workload::new(
            "ns",
            "pod-1",
            Utc::now() - chrono::Duration::hours(48),
        )]);
        let cancel = CancellationToken::new();
        let mut daemon = Daemon::new(
            Settings::default(),
            PacingPolicy::from_secs(10),
            Arc::new(directory.clone()),
            Arc::new(NoopObserver),
            cancel.clone(),
        );

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(500)).await;
            trigger.cancel();
        });

        daemon.run(Duration::from_secs(120)).await.unwrap();
        daemon.shutdown().await;

        assert_eq!(directory.evictions().await.len(), 1);
        assert!(directory.workloads().await.is_empty());
    }
}
