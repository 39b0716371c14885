//! Jittered delay between consecutive evictions.

use std::time::Duration;

use rand::Rng;

/// Pacing between evictions.
///
/// Each delay is drawn uniformly from `[max_delay / 2, max_delay]` so that
/// consecutive evictions are never closer than half the configured bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    max_delay: Duration,
}

impl PacingPolicy {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    /// Policy from a bound expressed in whole seconds.
    pub fn from_secs(max_delay_secs: u64) -> Self {
        Self::new(Duration::from_secs(max_delay_secs))
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Lower bound of the sampled delay.
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.max_millis().div_ceil(2))
    }

    /// Sample a delay at millisecond resolution, both bounds inclusive.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max = self.max_millis();
        let min = max.div_ceil(2);
        Duration::from_millis(rng.gen_range(min..=max))
    }

    fn max_millis(&self) -> u64 {
        u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX)
    }
}
