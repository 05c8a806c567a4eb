//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Order in which idle objects are lent out again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReuseOrder {
    /// Most recently returned object first. Keeps the warm set small and lets
    /// rarely used objects reach their idle timeout.
    #[default]
    Lifo,

    /// Least recently returned object first. Spreads use evenly.
    Fifo,
}

/// Configuration for object pool behavior
///
/// # Examples
///
/// ```
/// use esox_actorpool::{PoolConfiguration, ReuseOrder};
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(8)
///     .with_idle_timeout(Duration::from_secs(30))
///     .with_timeout(Duration::from_secs(5))
///     .with_reuse_order(ReuseOrder::Fifo);
///
/// assert_eq!(config.capacity, 8);
/// assert_eq!(config.operation_timeout, Some(Duration::from_secs(5)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfiguration {
    /// Maximum number of objects that can be checked out simultaneously
    pub capacity: usize,

    /// How long a returned object may sit unused before it is closed
    pub idle_timeout: Duration,

    /// Timeout applied by `acquire`; `None` waits indefinitely
    pub operation_timeout: Option<Duration>,

    /// Number of objects to create up front
    pub warmup_size: Option<usize>,

    /// Reuse order of idle objects
    pub reuse_order: ReuseOrder,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            capacity: 50,
            idle_timeout: Duration::from_secs(300),
            operation_timeout: None,
            warmup_size: None,
            reuse_order: ReuseOrder::Lifo,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of simultaneously checked out objects
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the idle timeout after which unused objects are closed
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the timeout applied by `acquire`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Set warm-up size
    pub fn with_warmup(mut self, size: usize) -> Self {
        self.warmup_size = Some(size);
        self
    }

    /// Set the reuse order of idle objects
    pub fn with_reuse_order(mut self, order: ReuseOrder) -> Self {
        self.reuse_order = order;
        self
    }

    /// Check the configuration for values the pool cannot run with
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfiguration(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(PoolError::InvalidConfiguration(
                "idle_timeout must be greater than zero".to_string(),
            ));
        }
        if self.operation_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::InvalidConfiguration(
                "operation_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Warm-up size capped at capacity
    pub(crate) fn effective_warmup(&self) -> usize {
        self.warmup_size.unwrap_or(0).min(self.capacity)
    }
}
