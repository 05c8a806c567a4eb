//! Error types for the object pool

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Boxed error produced by a resource factory or close capability
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Failed to construct a pooled resource: {0}")]
    Construction(Arc<BoxError>),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Pool has been disposed")]
    Disposed,

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Pool must be created from within a Tokio runtime")]
    NoRuntime,
}

impl PoolError {
    pub(crate) fn construction(error: BoxError) -> Self {
        PoolError::Construction(Arc::new(error))
    }

    /// Whether the caller gave up on an acquire before it completed
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PoolError::Timeout(_) | PoolError::Cancelled)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_error_keeps_source_message() {
        let err = PoolError::construction("connection refused".into());
        assert_eq!(
            err.to_string(),
            "Failed to construct a pooled resource: connection refused"
        );
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_cancellation_outcomes() {
        assert!(PoolError::Timeout(Duration::from_millis(10)).is_cancellation());
        assert!(PoolError::Cancelled.is_cancellation());
        assert!(!PoolError::Disposed.is_cancellation());
    }
}
