//! Metrics for the admission queue.
//!
//! Counters live inside the queue's critical section, so every update is
//! serialized with the occupancy change it describes and a snapshot is
//! always internally consistent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative queue counters since creation or the last reset
#[derive(Debug, Default, Clone)]
pub struct QueueMetrics {
    /// Items whose execution ended, whatever the outcome
    pub total_processed: u64,

    /// Items that were placed in the waiting list
    pub total_queued: u64,

    /// Items rejected because both ceilings were reached
    pub total_rejected: u64,

    /// Items that gave up after waiting longer than the queue timeout
    pub total_timed_out: u64,

    /// Highest concurrent execution count observed
    pub peak_processing: u64,

    /// Highest waiting list length observed
    pub peak_queued: u64,

    /// Items promoted from the waiting list (for averaging)
    pub total_promoted: u64,

    /// Total queue wait time in milliseconds (for averaging)
    pub total_queue_wait_ms: u64,

    /// Total processing time in milliseconds (for averaging)
    pub total_processing_ms: u64,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item starting immediately, with the new execution count
    pub fn record_started(&mut self, processing: usize) {
        self.peak_processing = self.peak_processing.max(processing as u64);
    }

    /// Record an item entering the waiting list, with the new list length
    pub fn record_queued(&mut self, queued: usize) {
        self.total_queued += 1;
        self.peak_queued = self.peak_queued.max(queued as u64);
    }

    /// Record a waiting item taking over a freed slot
    pub fn record_promoted(&mut self, wait_time: Duration) {
        self.total_promoted += 1;
        self.total_queue_wait_ms += wait_time.as_millis() as u64;
    }

    /// Record an item finishing execution
    pub fn record_completed(&mut self, processing_time: Duration) {
        self.total_processed += 1;
        self.total_processing_ms += processing_time.as_millis() as u64;
    }

    /// Record a submission rejected for capacity
    pub fn record_rejected(&mut self) {
        self.total_rejected += 1;
    }

    /// Record a waiting item that exceeded the queue timeout
    pub fn record_timeout(&mut self) {
        self.total_timed_out += 1;
    }

    /// Calculate average queue wait time in milliseconds
    pub fn avg_queue_wait_ms(&self) -> f64 {
        if self.total_promoted == 0 {
            return 0.0;
        }
        self.total_queue_wait_ms as f64 / self.total_promoted as f64
    }

    /// Calculate average processing time in milliseconds
    pub fn avg_processing_ms(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        self.total_processing_ms as f64 / self.total_processed as f64
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_processed: self.total_processed,
            total_queued: self.total_queued,
            total_rejected: self.total_rejected,
            total_timed_out: self.total_timed_out,
            peak_processing: self.peak_processing,
            peak_queued: self.peak_queued,
            avg_queue_wait_ms: self.avg_queue_wait_ms(),
            avg_processing_ms: self.avg_processing_ms(),
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_processed: u64,
    pub total_queued: u64,
    pub total_rejected: u64,
    pub total_timed_out: u64,
    pub peak_processing: u64,
    pub peak_queued: u64,
    pub avg_queue_wait_ms: f64,
    pub avg_processing_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let mut metrics = QueueMetrics::new();

        metrics.record_queued(1);
        metrics.record_promoted(Duration::from_millis(100));
        metrics.record_completed(Duration::from_millis(500));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_queued, 1);
        assert_eq!(snapshot.total_processed, 1);
        assert_eq!(snapshot.avg_queue_wait_ms, 100.0);
        assert_eq!(snapshot.avg_processing_ms, 500.0);
    }

    #[test]
    fn test_peaks_are_monotonic() {
        let mut metrics = QueueMetrics::new();

        for depth in 1..=5 {
            metrics.record_queued(depth);
        }
        metrics.record_queued(2);
        metrics.record_started(3);
        metrics.record_started(1);

        assert_eq!(metrics.peak_queued, 5);
        assert_eq!(metrics.peak_processing, 3);
    }

    #[test]
    fn test_reset() {
        let mut metrics = QueueMetrics::new();
        metrics.record_started(4);
        metrics.record_rejected();
        metrics.record_timeout();
        metrics.record_completed(Duration::from_millis(10));

        metrics.reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_processed, 0);
        assert_eq!(snapshot.total_rejected, 0);
        assert_eq!(snapshot.total_timed_out, 0);
        assert_eq!(snapshot.peak_processing, 0);
        assert_eq!(snapshot.avg_processing_ms, 0.0);
    }

    #[test]
    fn test_averages_without_samples() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.avg_queue_wait_ms(), 0.0);
        assert_eq!(metrics.avg_processing_ms(), 0.0);
    }
}
