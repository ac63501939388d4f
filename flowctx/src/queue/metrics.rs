//! Counters describing queue traffic and backpressure.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Metrics for queue monitoring.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Items successfully enqueued.
    enqueued: AtomicU64,
    /// Items successfully dequeued.
    dequeued: AtomicU64,
    /// Enqueues that found the buffer full and had to wait.
    full_waits: AtomicU64,
    /// Suspended operations abandoned through cancellation.
    cancelled: AtomicU64,
    /// Last successful enqueue.
    last_enqueue_time: RwLock<Option<Instant>>,
    /// Last successful dequeue.
    last_dequeue_time: RwLock<Option<Instant>>,
}

impl QueueMetrics {
    /// Records a successful enqueue.
    pub fn record_enqueue(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        *self.last_enqueue_time.write() = Some(Instant::now());
    }

    /// Records a successful dequeue.
    pub fn record_dequeue(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
        *self.last_dequeue_time.write() = Some(Instant::now());
    }

    /// Records a producer waiting on a full buffer.
    pub fn record_full_wait(&self) {
        self.full_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an abandoned operation.
    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of enqueued items.
    #[must_use]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Returns the number of dequeued items.
    #[must_use]
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Returns how often a producer hit a full buffer.
    #[must_use]
    pub fn full_waits(&self) -> u64 {
        self.full_waits.load(Ordering::Relaxed)
    }

    /// Returns the number of cancelled operations.
    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns time since the last dequeue, if any.
    #[must_use]
    pub fn since_last_dequeue(&self) -> Option<std::time::Duration> {
        self.last_dequeue_time.read().map(|t| t.elapsed())
    }

    /// Returns time since the last enqueue, if any.
    #[must_use]
    pub fn since_last_enqueue(&self) -> Option<std::time::Duration> {
        self.last_enqueue_time.read().map(|t| t.elapsed())
    }

    /// Converts metrics to a dictionary.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "enqueued": self.enqueued(),
            "dequeued": self.dequeued(),
            "full_waits": self.full_waits(),
            "cancelled": self.cancelled(),
        })
    }
}
