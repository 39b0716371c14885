//! Discovery pass: find workloads older than their TTL and hand them off.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::daemon::Settings;
use crate::directory::WorkloadDirectory;
use crate::error::{RaccoonError, RaccoonResult};
use crate::handoff::{HandoffError, HandoffSender};
use crate::ttl::TtlResolver;
use crate::workload::{sort_by_age_desc, Workload, WorkloadRef};

/// One traversal of the current listing.
#[derive(Debug, Clone)]
pub struct DiscoveryPass {
    namespace: String,
    selector: String,
    default_ttl: Duration,
    resolver: TtlResolver,
}

impl DiscoveryPass {
    pub fn new(settings: &Settings) -> Self {
        Self {
            namespace: settings.namespace.clone(),
            selector: settings.selector.clone(),
            default_ttl: settings.default_ttl,
            resolver: TtlResolver::new(settings.ttl_annotation.clone()),
        }
    }

    /// List matching workloads, oldest first, and hand off every workload
    /// whose age exceeds its effective TTL.
    ///
    /// Each hand-off waits for the eviction worker. Returns the number of
    /// workloads handed off; cancellation ends the pass early without error.
    /// A listing failure or a malformed TTL annotation aborts the pass.
    pub async fn run(
        &self,
        directory: &dyn WorkloadDirectory,
        sender: &mut HandoffSender<WorkloadRef>,
        cancel: &CancellationToken,
    ) -> RaccoonResult<usize> {
        let mut workloads = directory
            .list_matching(&self.namespace, &self.selector)
            .await
            .map_err(|source| RaccoonError::DiscoveryFailed {
                namespace: self.namespace.clone(),
                selector: self.selector.clone(),
                source,
            })?;
        sort_by_age_desc(&mut workloads);

        let mut marked = 0;

        for workload in &workloads {
            let ttl = self.resolver.resolve(workload, self.default_ttl)?;
            // Hand-offs block on pacing, so each workload is aged when checked.
            let now = Utc::now();
            let age = workload.age_at(now);

            debug!(
                namespace = %workload.namespace,
                selector = %self.selector,
                pod = %workload.name,
                age = age.num_seconds(),
                "checking pod's age"
            );

            if !is_expired(workload, ttl, now) {
                continue;
            }

            match sender.send(workload.to_ref(), cancel).await {
                Ok(()) => {
                    marked += 1;
                    info!(
                        namespace = %workload.namespace,
                        selector = %self.selector,
                        pod = %workload.name,
                        age = age.num_seconds(),
                        "pod older than its ttl, marked for eviction"
                    );
                }
                Err(HandoffError::Cancelled(_)) => {
                    debug!(marked, "discovery cancelled");
                    return Ok(marked);
                }
                Err(HandoffError::Closed(pending)) => {
                    warn!(pod = %pending, "eviction worker is gone, stopping discovery");
                    return Ok(marked);
                }
            }
        }

        Ok(marked)
    }
}

/// `true` when the workload's age at `now` is strictly greater than `ttl`.
pub fn is_expired(workload: &Workload, ttl: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => workload.age_at(now) > ttl,
        // Larger than chrono can represent: never reached.
        Err(_) => false,
    }
}
