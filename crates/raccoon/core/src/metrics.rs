//! Eviction metrics

use prometheus::{IntCounterVec, Opts, Registry};

/// Receives successful evictions.
pub trait EvictionObserver: Send + Sync {
    /// Called once per successful, non dry-run eviction.
    fn workload_evicted(&self, namespace: &str);
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EvictionObserver for NoopObserver {
    fn workload_evicted(&self, _namespace: &str) {}
}

/// Prometheus counters for evictions
#[derive(Debug, Clone)]
pub struct EvictionMetrics {
    /// Evicted pods by namespace
    pub pods_deleted_total: IntCounterVec,
}

impl EvictionMetrics {
    /// Create and register eviction metrics
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let pods_deleted_total = IntCounterVec::new(
            Opts::new("raccoon_pods_deleted_total", "The total number of deleted pods"),
            &["namespace"],
        )?;
        registry.register(Box::new(pods_deleted_total.clone()))?;

        Ok(Self { pods_deleted_total })
    }

    /// Current count for a namespace
    pub fn deleted_in(&self, namespace: &str) -> u64 {
        self.pods_deleted_total.with_label_values(&[namespace]).get()
    }
}

impl EvictionObserver for EvictionMetrics {
    fn workload_evicted(&self, namespace: &str) {
        self.pods_deleted_total.with_label_values(&[namespace]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_per_namespace() {
        let registry = Registry::new();
        let metrics = EvictionMetrics::new(&registry).unwrap();

        metrics.workload_evicted("namespace-1");
        metrics.workload_evicted("namespace-1");
        metrics.workload_evicted("namespace-2");

        assert_eq!(metrics.deleted_in("namespace-1"), 2);
        assert_eq!(metrics.deleted_in("namespace-2"), 1);
        assert_eq!(metrics.deleted_in("namespace-3"), 0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        EvictionMetrics::new(&registry).unwrap();
        assert!(EvictionMetrics::new(&registry).is_err());
    }

    #[test]
    fn test_gathered_family_name() {
        let registry = Registry::new();
        let metrics = EvictionMetrics::new(&registry).unwrap();
        metrics.workload_evicted("ns1");

        let families = registry.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "raccoon_pods_deleted_total");
    }
}
