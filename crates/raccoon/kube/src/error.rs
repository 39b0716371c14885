//! Error types for raccoon-kube.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a Kubernetes client.
#[derive(Debug, Error)]
pub enum KubeError {
    /// Unknown value for the cluster location.
    #[error("unknown cluster location {0:?}, use either 'in' or 'out'")]
    UnknownLocation(String),

    /// The kubeconfig file does not exist.
    #[error("the kubeconfig path you gave does not exist: {}", .0.display())]
    KubeconfigMissing(PathBuf),

    /// No kubeconfig path could be determined.
    #[error("no kubeconfig available: set KUBECONFIG or pass --kubeconfig")]
    NoKubeconfig,

    /// In-cluster service account configuration failed.
    #[error("failed to get in-cluster config: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    /// Kubeconfig could not be loaded.
    #[error("failed to get client config: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Client construction failed.
    #[error("failed to create kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Result type for Kubernetes setup.
pub type KubeResult<T> = Result<T, KubeError>;
