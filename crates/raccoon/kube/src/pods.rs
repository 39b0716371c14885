//! Pod listing and eviction through the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, EvictParams, ListParams, PropagationPolicy};
use kube::Client;
use raccoon_core::{DirectoryError, DirectoryResult, Workload, WorkloadDirectory};
use tracing::warn;

/// [`WorkloadDirectory`] backed by the pods of a cluster.
#[derive(Clone)]
pub struct KubeDirectory {
    client: Client,
}

impl KubeDirectory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }
}

#[async_trait]
impl WorkloadDirectory for KubeDirectory {
    async fn list_matching(&self, namespace: &str, selector: &str) -> DirectoryResult<Vec<Workload>> {
        let params = ListParams::default().labels(selector);
        let pods = self
            .pods(namespace)
            .list(&params)
            .await
            .map_err(DirectoryError::backend)?;

        Ok(pods.items.iter().filter_map(workload_from_pod).collect())
    }

    async fn evict(&self, namespace: &str, name: &str) -> DirectoryResult<()> {
        // Foreground propagation through the Eviction subresource, so the
        // API server enforces PodDisruptionBudgets.
        let params = EvictParams {
            delete_options: Some(DeleteParams {
                propagation_policy: Some(PropagationPolicy::Foreground),
                ..DeleteParams::default()
            }),
            ..EvictParams::default()
        };

        Api::<Pod>::namespaced(self.client.clone(), namespace)
            .evict(name, &params)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                kube::Error::Api(ref resp) if resp.code == 404 => DirectoryError::NotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                },
                other => DirectoryError::backend(other),
            })
    }
}

/// Snapshot a pod. Pods missing a name, namespace or creation timestamp are
/// skipped.
pub fn workload_from_pod(pod: &Pod) -> Option<Workload> {
    let meta = &pod.metadata;
    let (Some(name), Some(namespace)) = (meta.name.as_ref(), meta.namespace.as_ref()) else {
        warn!("skipping pod without name or namespace");
        return None;
    };
    let Some(created) = meta.creation_timestamp.as_ref() else {
        warn!(pod = %name, namespace = %namespace, "skipping pod without creation timestamp");
        return None;
    };

    Some(Workload {
        name: name.clone(),
        namespace: namespace.clone(),
        created_at: created.0,
        annotations: meta.annotations.clone().unwrap_or_default(),
    })
}
