//! Cluster authentication: in-cluster service account or kubeconfig file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

use crate::error::{KubeError, KubeResult};

/// Where the daemon runs relative to the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterLocation {
    /// Inside a pod, using the mounted service account.
    #[default]
    InCluster,
    /// Outside the cluster, using a kubeconfig file.
    OutOfCluster,
}

impl FromStr for ClusterLocation {
    type Err = KubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(ClusterLocation::InCluster),
            "out" => Ok(ClusterLocation::OutOfCluster),
            other => Err(KubeError::UnknownLocation(other.to_string())),
        }
    }
}

/// Where the kubeconfig is read from when running out of cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeconfigSource {
    /// The `KUBECONFIG` environment variable (may list several files).
    Env,
    /// A single file given on the command line.
    File(PathBuf),
}

/// Pick the kubeconfig source. A non-empty `KUBECONFIG` wins over the flag;
/// a flag path must exist.
pub fn kubeconfig_source(env: Option<&str>, flag: Option<&Path>) -> KubeResult<KubeconfigSource> {
    if env.is_some_and(|v| !v.trim().is_empty()) {
        return Ok(KubeconfigSource::Env);
    }

    let path = flag.ok_or(KubeError::NoKubeconfig)?;
    if !path.exists() {
        return Err(KubeError::KubeconfigMissing(path.to_path_buf()));
    }
    Ok(KubeconfigSource::File(path.to_path_buf()))
}

/// Build a client for the given location.
pub async fn connect(location: ClusterLocation, kubeconfig: Option<&Path>) -> KubeResult<Client> {
    let config = match location {
        ClusterLocation::InCluster => {
            info!("authenticating with in-cluster service account");
            Config::incluster()?
        }
        ClusterLocation::OutOfCluster => {
            let env = std::env::var("KUBECONFIG").ok();
            let kubeconfig = match kubeconfig_source(env.as_deref(), kubeconfig)? {
                KubeconfigSource::Env => {
                    info!("authenticating with KUBECONFIG");
                    Kubeconfig::from_env()?.ok_or(KubeError::NoKubeconfig)?
                }
                KubeconfigSource::File(path) => {
                    info!(path = %path.display(), "authenticating with kubeconfig file");
                    Kubeconfig::read_from(&path)?
                }
            };
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
    };

    Ok(Client::try_from(config)?)
}
