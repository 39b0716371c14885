//! In-memory workload directory for development and testing

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::{DirectoryError, DirectoryResult, WorkloadDirectory};
use crate::workload::{Workload, WorkloadRef};

/// In-memory directory.
///
/// Selectors are recorded but not evaluated; namespaces filter the listing.
/// Evicted workloads disappear from later listings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    workloads: Arc<RwLock<Vec<Workload>>>,
    evictions: Arc<RwLock<Vec<WorkloadRef>>>,
    list_calls: Arc<RwLock<Vec<(String, String)>>>,
    list_failure: Arc<RwLock<Option<String>>>,
    evict_failures: Arc<RwLock<HashSet<WorkloadRef>>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with workloads
    pub fn with_workloads(workloads: impl IntoIterator<Item = Workload>) -> Self {
        Self {
            workloads: Arc::new(RwLock::new(workloads.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Add a workload
    pub async fn insert(&self, workload: Workload) {
        self.workloads.write().await.push(workload);
    }

    /// Make every subsequent listing fail with `message`
    pub async fn fail_listing(&self, message: impl Into<String>) {
        *self.list_failure.write().await = Some(message.into());
    }

    /// Make evictions of `workload` fail
    pub async fn fail_eviction_of(&self, workload: WorkloadRef) {
        self.evict_failures.write().await.insert(workload);
    }

    /// Successful evictions, in call order
    pub async fn evictions(&self) -> Vec<WorkloadRef> {
        self.evictions.read().await.clone()
    }

    /// `(namespace, selector)` of every listing call
    pub async fn list_calls(&self) -> Vec<(String, String)> {
        self.list_calls.read().await.clone()
    }

    /// Workloads still present
    pub async fn workloads(&self) -> Vec<Workload> {
        self.workloads.read().await.clone()
    }
}

#[async_trait]
impl WorkloadDirectory for InMemoryDirectory {
    async fn list_matching(&self, namespace: &str, selector: &str) -> DirectoryResult<Vec<Workload>> {
        self.list_calls
            .write()
            .await
            .push((namespace.to_string(), selector.to_string()));

        if let Some(message) = self.list_failure.read().await.as_ref() {
            return Err(DirectoryError::Message(message.clone()));
        }

        let workloads = self.workloads.read().await;
        Ok(workloads
            .iter()
            .filter(|w| namespace.is_empty() || w.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn evict(&self, namespace: &str, name: &str) -> DirectoryResult<()> {
        let target = WorkloadRef::new(namespace, name);
        if self.evict_failures.read().await.contains(&target) {
            return Err(DirectoryError::Message(format!(
                "cannot evict {target}: disruption budget exceeded"
            )));
        }

        let mut workloads = self.workloads.write().await;
        let before = workloads.len();
        workloads.retain(|w| !(w.namespace == namespace && w.name == name));
        if workloads.len() == before {
            return Err(DirectoryError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        drop(workloads);

        self.evictions.write().await.push(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_list_filters_namespace() {
        let directory = InMemoryDirectory::with_workloads([
            Workload::new("ns1", "pod-1", Utc::now()),
            Workload::new("ns2", "pod-2", Utc::now()),
        ]);

        let ns1 = directory.list_matching("ns1", "app=test").await.unwrap();
        assert_eq!(ns1.len(), 1);
        assert_eq!(ns1[0].name, "pod-1");

        let all = directory.list_matching("", "app=test").await.unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(
            directory.list_calls().await,
            vec![
                ("ns1".to_string(), "app=test".to_string()),
                (String::new(), "app=test".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_pod() {
        let directory = InMemoryDirectory::new();
        let pods = directory.list_matching("ns1", "app=test").await.unwrap();
        assert!(pods.is_empty());
    }

    #[tokio::test]
    async fn test_inserted_pod_is_listed() {
        let directory = InMemoryDirectory::new();
        directory.insert(Workload::new("ns1", "pod-1", Utc::now())).await;

        let pods = directory.list_matching("ns1", "app=test").await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "pod-1");
    }

    #[tokio::test]
    async fn test_evict_removes_workload() {
        let directory = InMemoryDirectory::with_workloads([Workload::new("ns1", "pod-1", Utc::now())]);

        directory.evict("ns1", "pod-1").await.unwrap();
        assert!(directory.workloads().await.is_empty());
        assert_eq!(directory.evictions().await, vec![WorkloadRef::new("ns1", "pod-1")]);

        let err = directory.evict("ns1", "pod-1").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_primed_failures() {
        let directory = InMemoryDirectory::with_workloads([Workload::new("ns1", "pod-1", Utc::now())]);
        directory.fail_eviction_of(WorkloadRef::new("ns1", "pod-1")).await;
        assert!(directory.evict("ns1", "pod-1").await.is_err());
        assert_eq!(directory.workloads().await.len(), 1);

        directory.fail_listing("apiserver unavailable").await;
        let err = directory.list_matching("ns1", "").await.unwrap_err();
        assert_eq!(err.to_string(), "apiserver unavailable");
    }
}
