//! Error vocabulary of the scheduling pool.

use core::fmt;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors surfaced by the scheduling core.
///
/// `QueueFull` and `QueueEmpty` never cross the pool boundary: the
/// pool converts them into condition-variable waits. They are part of
/// the vocabulary for policy implementors and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Scheduler at capacity (internal; submit blocks instead).
    QueueFull,

    /// Scheduler empty (internal; workers wait instead).
    QueueEmpty,

    /// Submit observed shutdown; the caller keeps the job and its
    /// endpoint.
    ShuttingDown,

    /// Replacement scheduler cannot hold the resident jobs; the swap
    /// was not performed.
    CapacityTooSmall,

    /// Thread spawn or allocation failure at create.
    ResourceExhausted,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::QueueFull => write!(f, "scheduler queue full"),
            PoolError::QueueEmpty => write!(f, "scheduler queue empty"),
            PoolError::ShuttingDown => write!(f, "pool shutting down"),
            PoolError::CapacityTooSmall => {
                write!(f, "replacement scheduler capacity too small")
            }
            PoolError::ResourceExhausted => write!(f, "resource exhausted"),
        }
    }
}

impl std::error::Error for PoolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", PoolError::ShuttingDown), "pool shutting down");
        assert_eq!(format!("{}", PoolError::QueueFull), "scheduler queue full");
        assert_eq!(
            format!("{}", PoolError::CapacityTooSmall),
            "replacement scheduler capacity too small"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(PoolError::ResourceExhausted);
        assert_eq!(e.to_string(), "resource exhausted");
    }
}
