//! Kubernetes backend for raccoon
//!
//! - [`connect`] builds a client from in-cluster credentials or a kubeconfig
//! - [`KubeDirectory`] lists pods by label selector and evicts them through
//!   the Eviction subresource

pub mod connect;
pub mod error;
pub mod pods;

pub use connect::{connect, kubeconfig_source, ClusterLocation, KubeconfigSource};
pub use error::{KubeError, KubeResult};
pub use pods::{workload_from_pod, KubeDirectory};
