//! Bounded FIFO queue that captures the submitter's identity.

use super::{QueueMetrics, WorkItem};
use crate::cancellation::CancellationToken;
use crate::config::QueueConfig;
use crate::context::{ContextAccessor, ContextSource};
use crate::errors::{FlowError, FlowResult};
use futures::Stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// A bounded, multi-producer multi-consumer queue of [`WorkItem`]s.
///
/// Every enqueue snapshots the submitting flow's identity through the
/// configured [`ContextSource`]. Producers wait while the buffer is full and
/// consumers wait while it is empty; both waits can be abandoned through a
/// [`CancellationToken`] without touching the queue.
pub struct BackgroundTaskQueue<P> {
    name: String,
    capacity: usize,
    source: Arc<dyn ContextSource>,
    sender: parking_lot::Mutex<Option<mpsc::Sender<WorkItem<P>>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<WorkItem<P>>>,
    pending: AtomicUsize,
    metrics: QueueMetrics,
}

impl<P> BackgroundTaskQueue<P> {
    /// Creates a queue reading identity from the ambient store.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidArgument`] if `capacity` is zero.
    pub fn new(capacity: usize) -> FlowResult<Self> {
        Self::with_source(QueueConfig::new().with_capacity(capacity), Arc::new(ContextAccessor::new()))
    }

    /// Creates a queue from configuration, reading identity from the ambient store.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidArgument`] if the configured capacity is zero.
    pub fn from_config(config: &QueueConfig) -> FlowResult<Self> {
        Self::with_source(config.clone(), Arc::new(ContextAccessor::new()))
    }

    /// Creates a queue reading identity from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidArgument`] if the configured capacity is zero.
    pub fn with_source(config: QueueConfig, source: Arc<dyn ContextSource>) -> FlowResult<Self> {
        if config.capacity == 0 {
            return Err(FlowError::invalid_argument(
                "capacity",
                "queue capacity must be greater than zero",
            ));
        }

        let (tx, rx) = mpsc::channel(config.capacity);
        debug!(queue = %config.name, capacity = config.capacity, "Created background queue");

        Ok(Self {
            name: config.name,
            capacity: config.capacity,
            source,
            sender: parking_lot::Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
            pending: AtomicUsize::new(0),
            metrics: QueueMetrics::default(),
        })
    }

    /// Submits `payload`, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::QueueClosed`] if the queue was closed.
    pub async fn enqueue(&self, payload: P) -> FlowResult<()> {
        self.enqueue_with(payload, None).await
    }

    /// Submits `payload`, waiting while the queue is full unless `cancel` fires.
    ///
    /// A cancelled enqueue leaves the queue untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Cancelled`] if `cancel` fires before space frees up,
    /// or [`FlowError::QueueClosed`] if the queue was closed.
    pub async fn enqueue_cancellable(
        &self,
        payload: P,
        cancel: &CancellationToken,
    ) -> FlowResult<()> {
        self.enqueue_with(payload, Some(cancel)).await
    }

    async fn enqueue_with(&self, payload: P, cancel: Option<&CancellationToken>) -> FlowResult<()> {
        let sender = self.sender()?;
        let item = WorkItem::capture(payload, &self.source.snapshot());

        if sender.capacity() == 0 {
            self.metrics.record_full_wait();
            trace!(queue = %self.name, "Queue full, waiting for space");
        }

        let reserved = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    self.metrics.record_cancelled();
                    return Err(FlowError::cancelled(token.reason()));
                }
                permit = sender.reserve() => permit,
            },
            None => sender.reserve().await,
        };
        let permit = reserved.map_err(|_| self.closed_error())?;

        // Count before publishing so a consumer never decrements past zero.
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            queue = %self.name,
            tenant_id = item.tenant_id().unwrap_or_default(),
            correlation_id = item.correlation_id().unwrap_or_default(),
            pending,
            "Enqueued work item"
        );
        permit.send(item);
        self.metrics.record_enqueue();
        Ok(())
    }

    /// Takes the oldest item, waiting while the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Cancelled`] if `cancel` fires first, or
    /// [`FlowError::QueueClosed`] once the queue is closed and drained.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> FlowResult<WorkItem<P>> {
        let mut receiver = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(self.cancelled_error(cancel)),
            guard = self.receiver.lock() => guard,
        };

        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(self.cancelled_error(cancel)),
            item = receiver.recv() => item,
        };

        match received {
            Some(item) => {
                self.on_dequeued(&item);
                Ok(item)
            }
            None => Err(self.closed_error()),
        }
    }

    /// Takes the oldest item if one is immediately available.
    ///
    /// Returns `None` when the queue is empty or another consumer is
    /// currently waiting on it.
    pub fn try_dequeue(&self) -> Option<WorkItem<P>> {
        let mut receiver = self.receiver.try_lock().ok()?;
        let item = receiver.try_recv().ok()?;
        self.on_dequeued(&item);
        Some(item)
    }

    /// Returns a stream of items that ends when `cancel` fires or the queue
    /// is closed and drained.
    pub fn drain<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = WorkItem<P>> + 'a
    where
        P: 'a,
    {
        futures::stream::unfold((), move |()| async move {
            match self.dequeue(cancel).await {
                Ok(item) => Some((item, ())),
                Err(e) => {
                    debug!(queue = %self.name, reason = %e, "Queue drain finished");
                    None
                }
            }
        })
    }

    /// Stops accepting new items.
    ///
    /// Items already buffered stay available to consumers. Producers already
    /// waiting for space may still complete.
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            info!(queue = %self.name, pending = self.pending_count(), "Closed background queue");
        }
    }

    /// Returns true once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Returns the number of items enqueued but not yet dequeued.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Returns the maximum number of buffered items.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the queue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns queue metrics.
    #[must_use]
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }

    fn sender(&self) -> FlowResult<mpsc::Sender<WorkItem<P>>> {
        self.sender.lock().clone().ok_or_else(|| self.closed_error())
    }

    fn on_dequeued(&self, item: &WorkItem<P>) {
        let pending = self.pending.fetch_sub(1, Ordering::SeqCst) - 1;
        self.metrics.record_dequeue();
        trace!(
            queue = %self.name,
            tenant_id = item.tenant_id().unwrap_or_default(),
            pending,
            "Dequeued work item"
        );
    }

    fn cancelled_error(&self, cancel: &CancellationToken) -> FlowError {
        self.metrics.record_cancelled();
        FlowError::cancelled(cancel.reason())
    }

    fn closed_error(&self) -> FlowError {
        FlowError::QueueClosed(self.name.clone())
    }
}

impl<P> std::fmt::Debug for BackgroundTaskQueue<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTaskQueue")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
