//! Prometheus metrics for imagegate
//!
//! Exposes metrics in Prometheus format for monitoring and observability.

use imagegate_core::QueueStatus;
use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry for imagegate metrics
    pub static ref REGISTRY: Registry = Registry::new();

    // ============== Request Metrics ==============

    /// Total image requests with operation and status labels
    pub static ref REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("requests_total", "Total number of image requests")
            .namespace("imagegate"),
        &["operation", "status"]
    ).expect("metric can be created");

    /// Request duration histogram, queue wait included
    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "request_duration_seconds",
            "Image request duration in seconds, including time spent queued"
        )
        .namespace("imagegate")
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0]),
        &["operation"]
    ).expect("metric can be created");

    // ============== Queue Metrics ==============

    /// Current waiting list length
    pub static ref QUEUE_SIZE: Gauge = Gauge::with_opts(
        Opts::new("queue_waiting", "Current number of requests waiting for a slot")
            .namespace("imagegate")
    ).expect("metric can be created");

    /// Requests currently executing
    pub static ref ACTIVE_REQUESTS: Gauge = Gauge::with_opts(
        Opts::new("queue_processing", "Number of requests currently being processed")
            .namespace("imagegate")
    ).expect("metric can be created");

    /// Maximum concurrent requests gauge
    pub static ref MAX_CONCURRENT_REQUESTS: Gauge = Gauge::with_opts(
        Opts::new("max_concurrent_requests", "Maximum concurrent requests allowed")
            .namespace("imagegate")
    ).expect("metric can be created");

    /// Requests the admission queue turned away, by reason
    pub static ref REQUESTS_REJECTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "requests_rejected_total",
            "Total requests turned away by the admission queue (queue_full, queue_timeout, shutdown)"
        )
        .namespace("imagegate"),
        &["reason"]
    ).expect("metric can be created");
}

/// Register all metrics with the global registry.
/// Should be called once at startup.
pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEST_DURATION_SECONDS.clone()))?;

    REGISTRY.register(Box::new(QUEUE_SIZE.clone()))?;
    REGISTRY.register(Box::new(ACTIVE_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(MAX_CONCURRENT_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(REQUESTS_REJECTED_TOTAL.clone()))?;

    Ok(())
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# Error encoding metrics: {}", e))
}

/// Copy queue occupancy into the gauges. Called at scrape time.
pub fn set_queue_gauges(status: &QueueStatus) {
    ACTIVE_REQUESTS.set(status.processing as f64);
    QUEUE_SIZE.set(status.queued as f64);
    MAX_CONCURRENT_REQUESTS.set(status.max_concurrent as f64);
}

/// Record a request the admission queue turned away.
pub fn record_rejected(reason: &str) {
    REQUESTS_REJECTED_TOTAL.with_label_values(&[reason]).inc();
}

/// Helper struct for tracking request duration.
/// Records the request as an error if dropped without an explicit outcome.
pub struct RequestTimer {
    operation: &'static str,
    start: std::time::Instant,
    recorded: bool,
}

impl RequestTimer {
    /// Start a new request timer for the given operation.
    pub fn new(operation: &'static str) -> Self {
        Self { operation, start: std::time::Instant::now(), recorded: false }
    }

    /// Record a successful request completion.
    pub fn record_success(mut self) {
        self.record("success");
    }

    /// Record a failed request.
    pub fn record_failure(mut self) {
        self.record("error");
    }

    /// Record a request the queue turned away, labelled with `reason`.
    pub fn record_rejected(mut self, reason: &str) {
        record_rejected(reason);
        self.record("rejected");
    }

    fn record(&mut self, status: &str) {
        REQUEST_DURATION_SECONDS
            .with_label_values(&[self.operation])
            .observe(self.start.elapsed().as_secs_f64());
        REQUESTS_TOTAL
            .with_label_values(&[self.operation, status])
            .inc();
        self.recorded = true;
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.recorded {
            self.record("error");
        }
    }
}
