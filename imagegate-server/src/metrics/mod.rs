//! Metrics module for imagegate
//!
//! Provides Prometheus metrics for monitoring and observability.

pub mod prometheus;

pub use self::prometheus::{
    encode_metrics, record_rejected, register_metrics, set_queue_gauges, RequestTimer,
    ACTIVE_REQUESTS, MAX_CONCURRENT_REQUESTS, QUEUE_SIZE, REQUESTS_REJECTED_TOTAL,
};
