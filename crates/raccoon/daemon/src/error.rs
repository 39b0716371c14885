//! Error types for raccoon-daemon

use raccoon_core::RaccoonError;
use raccoon_kube::KubeError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration sources could not be merged
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Cluster connection error
    #[error("Cluster error: {0}")]
    Kube(#[from] KubeError),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Metrics server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scheduling stopped on a fatal error
    #[error(transparent)]
    Raccoon(#[from] RaccoonError),
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
