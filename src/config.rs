//! Pool configuration.
//!
//! An explicit configuration struct passed at construction time. There is no
//! ambient property-file lookup; callers that load settings from files do so
//! themselves and hand the result here.

use std::time::Duration;

pub const DEFAULT_INITIAL_SIZE: u32 = 4;
pub const DEFAULT_MAX_IDLE: u32 = 16;
pub const DEFAULT_MAX_TOTAL: u32 = 32;
pub const DEFAULT_MAX_WAIT_MILLIS: u64 = 10_000;

/// Connection pool sizing and acquisition bounds.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connections opened eagerly at pool construction (default: 4).
    pub initial_size: u32,
    /// Upper bound on idle connections retained by the pool (default: 16).
    pub max_idle: u32,
    /// Hard cap on total connections (default: 32).
    pub max_total: u32,
    /// How long an acquire may block on an exhausted pool before failing
    /// (default: 10000 ms). The resulting failure is terminal; nothing in
    /// this layer retries it.
    pub max_wait_millis: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            max_idle: DEFAULT_MAX_IDLE,
            max_total: DEFAULT_MAX_TOTAL,
            max_wait_millis: DEFAULT_MAX_WAIT_MILLIS,
        }
    }
}

impl PoolConfig {
    /// Acquire wait bound as a `Duration`.
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_millis)
    }

    /// Validate sizing invariants and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_total == 0 {
            return Err("max_total must be greater than 0".to_string());
        }
        if self.initial_size > self.max_total {
            return Err(format!(
                "initial_size ({}) cannot exceed max_total ({})",
                self.initial_size, self.max_total
            ));
        }
        if self.max_idle > self.max_total {
            return Err(format!(
                "max_idle ({}) cannot exceed max_total ({})",
                self.max_idle, self.max_total
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_size, 4);
        assert_eq!(config.max_idle, 16);
        assert_eq!(config.max_total, 32);
        assert_eq!(config.max_wait(), Duration::from_millis(10_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_total() {
        let config = PoolConfig {
            max_total: 0,
            ..PoolConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("max_total"));
    }

    #[test]
    fn test_validation_initial_exceeds_total() {
        let config = PoolConfig {
            initial_size: 64,
            ..PoolConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("initial_size"));
    }

    #[test]
    fn test_validation_idle_exceeds_total() {
        let config = PoolConfig {
            max_idle: 40,
            max_total: 32,
            ..PoolConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("max_idle"));
    }
}
