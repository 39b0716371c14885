//! Per-workload TTL resolution.
//!
//! A workload may override the daemon-wide TTL through an annotation whose
//! value is a humantime duration (`45s`, `1h`, `1h30m`, `1h 30m`, `1d`,
//! `1.5h`). Negative values are not durations and are rejected.

use std::time::Duration;

use crate::error::{RaccoonError, RaccoonResult};
use crate::workload::Workload;

/// Annotation read by default when looking for a TTL override.
pub const DEFAULT_TTL_ANNOTATION: &str = "backmarket.com/raccoon-ttl";

/// Resolves the effective TTL of a workload.
#[derive(Debug, Clone)]
pub struct TtlResolver {
    annotation: String,
}

impl Default for TtlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_ANNOTATION)
    }
}

impl TtlResolver {
    /// Create a resolver reading overrides from `annotation`.
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
        }
    }

    /// Annotation key consulted by this resolver.
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// Return the override carried by `workload`, or `default_ttl` when the
    /// annotation is absent or blank.
    ///
    /// A value that does not parse is an error; there is no fallback to the
    /// default in that case.
    pub fn resolve(&self, workload: &Workload, default_ttl: Duration) -> RaccoonResult<Duration> {
        let Some(raw) = workload.annotations.get(&self.annotation) else {
            return Ok(default_ttl);
        };

        let value = raw.trim();
        if value.is_empty() {
            return Ok(default_ttl);
        }

        humantime::parse_duration(value).map_err(|source| RaccoonError::MalformedTtlAnnotation {
            namespace: workload.namespace.clone(),
            name: workload.name.clone(),
            key: self.annotation.clone(),
            value: raw.clone(),
            source,
        })
    }
}
