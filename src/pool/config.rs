//! Configuration for the candidate pool.

use super::PoolError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pool sizing and eviction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard ceiling on tracked candidates
    pub max_pool_size: usize,
    /// Consecutive failed probes after which a candidate is evicted for good
    pub max_consecutive_failures: u32,
    /// Minimum time between two replenishment crawls
    pub replenish_cooldown_seconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            max_consecutive_failures: 5,
            replenish_cooldown_seconds: 30,
        }
    }
}

impl PoolConfig {
    /// Check sizing against the replenishment target `min_pool_size`.
    pub fn validate(&self, min_pool_size: usize) -> Result<(), PoolError> {
        if self.max_pool_size < min_pool_size {
            return Err(PoolError::CapacityBelowTarget {
                max: self.max_pool_size,
                min: min_pool_size,
            });
        }
        if self.max_consecutive_failures == 0 {
            return Err(PoolError::ZeroFailureCeiling);
        }
        Ok(())
    }

    pub fn replenish_cooldown(&self) -> Duration {
        Duration::from_secs(self.replenish_cooldown_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(PoolConfig::default().validate(3).is_ok());
    }

    #[test]
    fn test_capacity_below_target() {
        let config = PoolConfig {
            max_pool_size: 2,
            ..Default::default()
        };
        assert_eq!(
            config.validate(3),
            Err(PoolError::CapacityBelowTarget { max: 2, min: 3 })
        );
    }

    #[test]
    fn test_zero_failure_ceiling() {
        let config = PoolConfig {
            max_consecutive_failures: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(3), Err(PoolError::ZeroFailureCeiling));
    }
}
