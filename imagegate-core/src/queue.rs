//! Admission queue with concurrency control for imagegate.
//!
//! Work items run immediately while execution slots are free, wait in a
//! bounded FIFO once they are not, and are rejected when the FIFO is full.
//! A finished item hands its slot straight to the head of the waiting list,
//! so the execution count never dips while items are waiting and newly
//! submitted work cannot overtake them.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::error::{ConfigError, QueueError};
use crate::metrics::{MetricsSnapshot, QueueMetrics};

/// Point-in-time view of queue occupancy and cumulative metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Items currently executing
    pub processing: usize,
    /// Items currently waiting for a slot
    pub queued: usize,
    pub max_concurrent: usize,
    pub max_queue_size: usize,
    pub metrics: MetricsSnapshot,
}

impl QueueStatus {
    /// Share of execution slots in use, as a percentage
    pub fn concurrency_utilization(&self) -> f64 {
        percent(self.processing, self.max_concurrent)
    }

    /// Share of the waiting list in use, as a percentage
    pub fn queue_utilization(&self) -> f64 {
        percent(self.queued, self.max_queue_size)
    }

    /// Whether a submission made at this point would be rejected
    pub fn is_saturated(&self) -> bool {
        self.processing >= self.max_concurrent && self.queued >= self.max_queue_size
    }
}

fn percent(used: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    used as f64 / capacity as f64 * 100.0
}

/// An item waiting for a slot
struct Waiter {
    id: u64,
    slot: oneshot::Sender<SlotPermit>,
}

struct QueueState {
    processing: usize,
    waiting: VecDeque<Waiter>,
    next_waiter_id: u64,
    metrics: QueueMetrics,
}

struct Shared {
    config: QueueConfig,
    state: Mutex<QueueState>,
}

impl Shared {
    /// Give a freed slot to the next live waiter, or return it to the pool.
    ///
    /// Runs without the lock held while a permit is handed over, so a
    /// rejected hand-off can be dropped safely.
    fn release(self: &Arc<Self>, started_at: Option<Instant>) {
        let mut next = {
            let mut state = self.state.lock();
            if let Some(started_at) = started_at {
                state.metrics.record_completed(started_at.elapsed());
            }
            pop_or_free(&mut state)
        };

        while let Some(waiter) = next {
            match waiter.slot.send(SlotPermit::new(Arc::clone(self))) {
                Ok(()) => return,
                Err(permit) => {
                    // Receiver is gone; the slot stays ours.
                    permit.disarm();
                    next = pop_or_free(&mut self.state.lock());
                }
            }
        }
    }

    fn remove_waiter(&self, id: u64) -> Option<Waiter> {
        let mut state = self.state.lock();
        let index = state.waiting.iter().position(|w| w.id == id)?;
        state.waiting.remove(index)
    }
}

/// Pop the head waiter, or free the slot when nobody is waiting
fn pop_or_free(state: &mut QueueState) -> Option<Waiter> {
    let waiter = state.waiting.pop_front();
    if waiter.is_none() {
        state.processing -= 1;
    }
    waiter
}

/// Ownership of one execution slot. Dropping it releases the slot exactly once.
struct SlotPermit {
    shared: Option<Arc<Shared>>,
    started_at: Option<Instant>,
}

impl SlotPermit {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared: Some(shared), started_at: None }
    }

    fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Drop without releasing; used when a hand-off is refused
    fn disarm(mut self) {
        self.shared = None;
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release(self.started_at);
        }
    }
}

/// Removes a waiter from the list if its caller stops waiting
struct WaitGuard<'a> {
    shared: &'a Shared,
    id: u64,
    armed: bool,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let abandoned = self.shared.remove_waiter(self.id);
            if abandoned.is_some() {
                debug!(waiter = self.id, "Waiting request abandoned");
            }
        }
    }
}

enum Admission {
    Run(SlotPermit),
    Wait {
        id: u64,
        enqueued_at: Instant,
        slot: oneshot::Receiver<SlotPermit>,
    },
}

/// Admission queue bounding concurrent execution of expensive work.
///
/// Cloning is cheap and every clone shares the same slots, waiting list
/// and metrics. Construct one per process and hand it to whoever submits
/// work.
#[derive(Clone)]
pub struct AdmissionQueue {
    shared: Arc<Shared>,
}

impl AdmissionQueue {
    /// Create a new admission queue with the given configuration
    pub fn new(config: QueueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = QueueState {
            processing: 0,
            waiting: VecDeque::with_capacity(config.max_queue_size.min(1024)),
            next_waiter_id: 0,
            metrics: QueueMetrics::new(),
        };
        Ok(Self { shared: Arc::new(Shared { config, state: Mutex::new(state) }) })
    }

    /// Queue configuration
    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Run `work` once a slot is available and return its output.
    ///
    /// The output is passed back untouched, so a work item that returns
    /// `Result` reports its own failures inside `Ok`. `work` is never
    /// invoked when the submission is rejected.
    ///
    /// Admitted work runs on its own task, which owns the slot until the
    /// work completes. Dropping the returned future while the item waits
    /// removes it from the waiting list; dropping it while the item runs
    /// only discards the output.
    pub async fn submit<F, Fut>(&self, work: F) -> Result<Fut::Output, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut permit = match self.admit()? {
            Admission::Run(permit) => permit,
            Admission::Wait { id, enqueued_at, slot } => {
                self.wait_for_slot(id, enqueued_at, slot).await?
            }
        };

        let task = tokio::spawn(async move {
            permit.start();
            let output = work().await;
            drop(permit);
            output
        });

        match task.await {
            Ok(output) => Ok(output),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(QueueError::Shutdown),
        }
    }

    /// Capacity check and state change in a single critical section
    fn admit(&self) -> Result<Admission, QueueError> {
        let QueueConfig { max_concurrent, max_queue_size, .. } = self.shared.config;
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        if state.processing < max_concurrent && state.waiting.is_empty() {
            state.processing += 1;
            state.metrics.record_started(state.processing);
            return Ok(Admission::Run(SlotPermit::new(Arc::clone(&self.shared))));
        }

        if state.waiting.len() < max_queue_size {
            let id = state.next_waiter_id;
            state.next_waiter_id += 1;

            let (tx, rx) = oneshot::channel();
            let enqueued_at = Instant::now();
            state.waiting.push_back(Waiter { id, slot: tx });
            state.metrics.record_queued(state.waiting.len());

            debug!(
                waiter = id,
                queue_depth = state.waiting.len(),
                processing = state.processing,
                "Request enqueued"
            );

            return Ok(Admission::Wait { id, enqueued_at, slot: rx });
        }

        state.metrics.record_rejected();
        drop(guard);

        warn!(max_concurrent, max_queue_size, "Queue full, request rejected");
        Err(QueueError::capacity(max_concurrent, max_queue_size))
    }

    async fn wait_for_slot(
        &self,
        id: u64,
        enqueued_at: Instant,
        slot: oneshot::Receiver<SlotPermit>,
    ) -> Result<SlotPermit, QueueError> {
        let mut guard = WaitGuard { shared: &self.shared, id, armed: true };

        let received = match self.shared.config.queue_timeout {
            Some(limit) => {
                let remaining = limit.saturating_sub(enqueued_at.elapsed());
                match tokio::time::timeout(remaining, slot).await {
                    Ok(received) => received,
                    Err(_) => {
                        guard.armed = false;
                        return Err(self.expire(id, enqueued_at.elapsed()));
                    }
                }
            }
            None => slot.await,
        };
        guard.armed = false;

        let permit = received.map_err(|_| QueueError::Shutdown)?;
        let wait_time = enqueued_at.elapsed();
        self.shared.state.lock().metrics.record_promoted(wait_time);

        debug!(waiter = id, wait_ms = wait_time.as_millis() as u64, "Request dequeued");

        Ok(permit)
    }

    fn expire(&self, id: u64, waited: Duration) -> QueueError {
        let expired = self.shared.remove_waiter(id);
        self.shared.state.lock().metrics.record_timeout();
        drop(expired);

        warn!(waiter = id, waited_ms = waited.as_millis() as u64, "Request timed out in queue");
        QueueError::Timeout { waited }
    }

    /// Snapshot of current occupancy and cumulative metrics
    pub fn status(&self) -> QueueStatus {
        let state = self.shared.state.lock();
        QueueStatus {
            processing: state.processing,
            queued: state.waiting.len(),
            max_concurrent: self.shared.config.max_concurrent,
            max_queue_size: self.shared.config.max_queue_size,
            metrics: state.metrics.snapshot(),
        }
    }

    /// Zero cumulative counters without touching occupancy
    pub fn reset_metrics(&self) {
        self.shared.state.lock().metrics.reset();
        debug!("Queue metrics reset");
    }

    /// Items currently executing
    pub fn processing(&self) -> usize {
        self.shared.state.lock().processing
    }

    /// Items currently waiting for a slot
    pub fn queued(&self) -> usize {
        self.shared.state.lock().waiting.len()
    }

    /// Whether the next submission would be rejected
    pub fn is_saturated(&self) -> bool {
        self.status().is_saturated()
    }
}

impl std::fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("AdmissionQueue")
            .field("processing", &state.processing)
            .field("queued", &state.waiting.len())
            .field("config", &self.shared.config)
            .finish()
    }
}
