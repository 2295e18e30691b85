//! imagegate core library
//!
//! Admission control for expensive calls to an external image-generation
//! provider. The [`AdmissionQueue`] bounds how many work items run at once,
//! holds a bounded FIFO of waiting items, and rejects anything beyond that.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             submit(work)                     │
//! └──────────────────────┬──────────────────────┘
//!                        │
//!              ┌─────────▼─────────┐
//!              │  capacity check   │ ← single critical section
//!              └──┬──────┬──────┬──┘
//!         run now │ wait │      │ reject
//!                 │  ┌───▼────┐ │
//!                 │  │  FIFO  │ │ → QueueError::CapacityExceeded
//!                 │  └───┬────┘ │
//!              ┌──▼──────▼──┐
//!              │ SlotPermit │ ← released on drop, hands slot to next waiter
//!              └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use imagegate_core::{AdmissionQueue, QueueConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let queue = AdmissionQueue::new(QueueConfig::new(2, 10)).unwrap();
//!
//! let answer = queue.submit(|| async { 21 * 2 }).await.unwrap();
//! assert_eq!(answer, 42);
//!
//! let status = queue.status();
//! assert_eq!(status.processing, 0);
//! assert_eq!(status.metrics.total_processed, 1);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;

pub use config::QueueConfig;
pub use error::{ConfigError, QueueError};
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use queue::{AdmissionQueue, QueueStatus};
