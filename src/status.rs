//! Pool lifecycle state and status snapshots

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle of a pool's coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PoolState {
    /// Serving acquires, releases and idle expiry
    Running,

    /// Shutting down: idle objects are closed, checked out objects are
    /// closed as they come back, no new acquires are accepted
    Disposing,

    /// Every object has been closed and the coordinator has stopped
    Disposed,
}

/// Snapshot of the coordinator's bookkeeping
///
/// # Examples
///
/// ```
/// use esox_actorpool::{PoolState, PoolStatus};
///
/// let status = PoolStatus::new(PoolState::Running, 2, 3, 4);
/// assert_eq!(status.utilization, 0.75);
/// assert!(!status.is_saturated());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStatus {
    /// Current lifecycle state
    pub state: PoolState,

    /// Objects waiting in the pool
    pub idle: usize,

    /// Objects currently checked out
    pub outstanding: usize,

    /// Maximum number of checked out objects
    pub capacity: usize,

    /// Checked out objects relative to capacity (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolStatus {
    /// Create a status snapshot
    pub fn new(state: PoolState, idle: usize, outstanding: usize, capacity: usize) -> Self {
        let utilization = if capacity > 0 {
            outstanding as f64 / capacity as f64
        } else {
            0.0
        };

        Self {
            state,
            idle,
            outstanding,
            capacity,
            utilization,
        }
    }

    /// Whether further acquires have to wait for a release
    pub fn is_saturated(&self) -> bool {
        self.outstanding >= self.capacity
    }
}
