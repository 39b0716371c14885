//! Error types for raccoon-core.

use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors that end a discovery pass.
///
/// Both variants are fatal for the daemon loop; eviction failures never
/// surface here.
#[derive(Debug, Error)]
pub enum RaccoonError {
    /// Listing workloads from the directory failed.
    #[error("discovery failed for namespace {namespace:?} with selector {selector:?}: {source}")]
    DiscoveryFailed {
        namespace: String,
        selector: String,
        #[source]
        source: DirectoryError,
    },

    /// A workload carries a TTL override that is not a valid duration.
    #[error("malformed ttl annotation {key}={value:?} on {namespace}/{name}: {source}")]
    MalformedTtlAnnotation {
        namespace: String,
        name: String,
        key: String,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}

/// Result type for core operations.
pub type RaccoonResult<T> = Result<T, RaccoonError>;
