//! Operational status report: queue occupancy, process memory and alerts.

use imagegate_core::{MetricsSnapshot, QueueStatus};
use serde::{Deserialize, Serialize};
use sysinfo::{ProcessesToUpdate, System};

use crate::config::AlertThresholds;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Memory used by this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Resident set size, MB
    pub rss_mb: u64,
    /// Virtual memory size, MB
    pub virtual_mb: u64,
}

impl MemorySnapshot {
    /// Read current process memory from the OS.
    ///
    /// Returns zeros on platforms where the process cannot be inspected.
    pub fn capture() -> Self {
        let Ok(pid) = sysinfo::get_current_pid() else {
            return Self::default();
        };

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        system
            .process(pid)
            .map(|process| Self {
                rss_mb: process.memory() / BYTES_PER_MB,
                virtual_mb: process.virtual_memory() / BYTES_PER_MB,
            })
            .unwrap_or_default()
    }
}

/// Utilization percentages derived from queue occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub concurrency_percent: f64,
    pub queue_percent: f64,
}

/// Body of GET /admin/queue/status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub processing: usize,
    pub queued: usize,
    pub max_concurrent: usize,
    pub max_queue_size: usize,
    pub utilization: Utilization,
    pub metrics: MetricsSnapshot,
    pub memory: MemorySnapshot,
    pub alerts: Vec<String>,
    pub timestamp: String,
}

impl StatusReport {
    pub fn new(status: QueueStatus, memory: MemorySnapshot, thresholds: &AlertThresholds) -> Self {
        let utilization = Utilization {
            concurrency_percent: round1(status.concurrency_utilization()),
            queue_percent: round1(status.queue_utilization()),
        };
        let alerts = evaluate_alerts(&utilization, &memory, thresholds);

        Self {
            processing: status.processing,
            queued: status.queued,
            max_concurrent: status.max_concurrent,
            max_queue_size: status.max_queue_size,
            utilization,
            metrics: status.metrics,
            memory,
            alerts,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Alert messages for every threshold that is exceeded
pub fn evaluate_alerts(
    utilization: &Utilization,
    memory: &MemorySnapshot,
    thresholds: &AlertThresholds,
) -> Vec<String> {
    let mut alerts = Vec::new();

    if utilization.concurrency_percent > thresholds.concurrency_percent {
        alerts.push(format!(
            "High concurrency: {:.1}% of execution slots in use",
            utilization.concurrency_percent
        ));
    }
    if utilization.queue_percent > thresholds.queue_percent {
        alerts.push(format!(
            "Queue filling up: {:.1}% of waiting capacity in use",
            utilization.queue_percent
        ));
    }
    if memory.rss_mb > thresholds.memory_mb {
        alerts.push(format!("High memory usage: {} MB resident", memory.rss_mb));
    }

    alerts
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
