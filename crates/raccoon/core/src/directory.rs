//! Workload directory abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::workload::Workload;

/// Errors reported by a workload directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backend rejected or failed the request.
    #[error("directory backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The workload does not exist anymore.
    #[error("workload not found: {namespace}/{name}")]
    NotFound { namespace: String, name: String },

    /// Failure described only by a message.
    #[error("{0}")]
    Message(String),
}

impl DirectoryError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DirectoryError::Backend(Box::new(err))
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Capability set the core needs from the cluster.
///
/// An empty `namespace` means every namespace.
#[async_trait]
pub trait WorkloadDirectory: Send + Sync {
    /// List workloads matching a label selector.
    async fn list_matching(&self, namespace: &str, selector: &str) -> DirectoryResult<Vec<Workload>>;

    /// Request a graceful eviction that honours disruption budgets.
    async fn evict(&self, namespace: &str, name: &str) -> DirectoryResult<()>;
}
