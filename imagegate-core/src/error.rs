//! Error types for the imagegate core library
//!
//! The queue raises only its own admission errors. Failures produced by a
//! work item are part of that item's output and pass through untouched.
//!
//! # Error Hierarchy
//!
//! ```text
//! QueueError   - admission outcomes returned by `AdmissionQueue::submit`
//! ConfigError  - rejected queue configuration
//! ```

use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`AdmissionQueue::submit`](crate::AdmissionQueue::submit)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Both the execution slots and the waiting list are full.
    /// The work item was never invoked.
    #[error(
        "System is busy ({max_concurrent} running, {max_queue_size} waiting). \
         Please try again in a few seconds"
    )]
    CapacityExceeded {
        max_concurrent: usize,
        max_queue_size: usize,
    },

    /// The item waited longer than the configured queue timeout
    #[error("Request timed out after {waited:?} in queue")]
    Timeout { waited: Duration },

    /// The queue stopped before the item could finish: the slot hand-off
    /// closed, or the runtime cancelled the executing task
    #[error("Queue shutdown")]
    Shutdown,
}

impl QueueError {
    /// Create a capacity-exceeded error
    pub fn capacity(max_concurrent: usize, max_queue_size: usize) -> Self {
        Self::CapacityExceeded { max_concurrent, max_queue_size }
    }

    /// Short label for why the queue turned the item away
    pub fn reason(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "queue_full",
            Self::Timeout { .. } => "queue_timeout",
            Self::Shutdown => "shutdown",
        }
    }

    /// Whether the caller should retry after a short delay
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. } | Self::Timeout { .. })
    }
}

/// Errors raised when building a queue from a configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A queue that can never run anything would park every caller forever
    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,
}
