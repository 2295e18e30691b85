//! Configuration for the admission queue.

use std::time::Duration;

use crate::error::ConfigError;

/// Default ceiling on simultaneously executing work items
pub const DEFAULT_MAX_CONCURRENT: usize = 100;

/// Default ceiling on the waiting list length
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 500;

/// Configuration for the admission queue.
///
/// Fixed for the lifetime of a queue; there is no hot reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of work items executing at the same time
    pub max_concurrent: usize,

    /// Maximum number of work items waiting for a slot
    pub max_queue_size: usize,

    /// Maximum time an item may wait for a slot before it fails.
    /// `None` means items wait until promoted.
    pub queue_timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            queue_timeout: None,
        }
    }
}

impl QueueConfig {
    /// Create a config with explicit limits and no wait timeout
    pub fn new(max_concurrent: usize, max_queue_size: usize) -> Self {
        Self { max_concurrent, max_queue_size, queue_timeout: None }
    }

    /// Set the maximum time an item may wait in the queue
    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = Some(timeout);
        self
    }

    /// Create config from environment variables
    ///
    /// Unparseable values are ignored. A timeout of `0` disables it.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IMAGEGATE_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                config.max_concurrent = n;
            }
        }

        if let Ok(val) = std::env::var("IMAGEGATE_MAX_QUEUE") {
            if let Ok(n) = val.parse() {
                config.max_queue_size = n;
            }
        }

        if let Ok(val) = std::env::var("IMAGEGATE_QUEUE_TIMEOUT_SECS") {
            if let Ok(n) = val.parse::<u64>() {
                config.queue_timeout = (n > 0).then(|| Duration::from_secs(n));
            }
        }

        config
    }

    /// Check that the limits describe a usable queue
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
