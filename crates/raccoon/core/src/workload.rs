//! Workload snapshots and the references handed to the eviction worker.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Read-only snapshot of a workload returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub annotations: BTreeMap<String, String>,
}

impl Workload {
    /// Create a workload without annotations.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            created_at,
            annotations: BTreeMap::new(),
        }
    }

    /// Attach an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Age of the workload at `now`, truncated to whole seconds.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        Duration::seconds((now - self.created_at).num_seconds())
    }

    /// Project the workload down to the reference carried by the hand-off queue.
    pub fn to_ref(&self) -> WorkloadRef {
        WorkloadRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Minimal identifier of a workload selected for eviction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadRef {
    pub name: String,
    pub namespace: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Sort workloads oldest first. Equal creation times keep listing order.
pub fn sort_by_age_desc(workloads: &mut [Workload]) {
    workloads.sort_by_key(|w| w.created_at);
}
