//! Context-capturing background work queue.
//!
//! Submitting code enqueues plain payloads; the queue pairs each one with the
//! submitter's identity so a worker can later run it as that user and tenant.

mod metrics;
mod task_queue;
mod work_item;

pub use metrics::QueueMetrics;
pub use task_queue::BackgroundTaskQueue;
pub use work_item::WorkItem;
