//! Long-running consumer that replays each item under its captured identity.

use super::WorkItemHandler;
use crate::cancellation::CancellationToken;
use crate::context::AmbientContextStore;
use crate::errors::{FlowError, FlowResult};
use crate::observability::{flow_span, SpanTimer};
use crate::queue::{BackgroundTaskQueue, WorkItem};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

/// Outcome counters for one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Items whose handler succeeded.
    pub processed: u64,
    /// Items whose handler failed or panicked.
    pub failed: u64,
}

impl WorkerStats {
    /// Returns the number of items taken from the queue.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.processed + self.failed
    }
}

/// Drains a [`BackgroundTaskQueue`], running each payload in a fresh flow
/// seeded with the identity captured at enqueue time.
///
/// The flow is discarded after every item, so nothing written by one handler
/// is visible to the next. A failing handler is logged with the item's
/// tenant and the worker moves on.
pub struct BackgroundWorker<P, H> {
    name: String,
    queue: Arc<BackgroundTaskQueue<P>>,
    handler: Arc<H>,
}

impl<P, H> BackgroundWorker<P, H>
where
    P: Send + 'static,
    H: WorkItemHandler<P> + 'static,
{
    /// Creates a worker consuming `queue`.
    #[must_use]
    pub fn new(queue: Arc<BackgroundTaskQueue<P>>, handler: H) -> Self {
        Self {
            name: format!("{}-worker", queue.name()),
            queue,
            handler: Arc::new(handler),
        }
    }

    /// Sets the name used for spans and logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the worker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processes items until `cancel` fires or the queue is closed and drained.
    pub async fn run(&self, cancel: &CancellationToken) -> WorkerStats {
        info!(worker = %self.name, queue = %self.queue.name(), "Background worker started");
        let mut stats = WorkerStats::default();

        loop {
            let item = match self.queue.dequeue(cancel).await {
                Ok(item) => item,
                Err(e) => {
                    info!(worker = %self.name, reason = %e, "Background worker stopping");
                    break;
                }
            };

            let tenant_id = item.tenant_id().unwrap_or_default().to_string();
            let correlation_id = item.correlation_id().unwrap_or_default().to_string();
            let timer = SpanTimer::start(&self.name);

            match self.process(item).await {
                Ok(()) => {
                    stats.processed += 1;
                    debug!(
                        worker = %self.name,
                        tenant_id = %tenant_id,
                        duration_ms = timer.finish(),
                        "Work item processed"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        worker = %self.name,
                        tenant_id = %tenant_id,
                        correlation_id = %correlation_id,
                        error = %e,
                        "Work item failed"
                    );
                }
            }
        }

        info!(
            worker = %self.name,
            processed = stats.processed,
            failed = stats.failed,
            "Background worker stopped"
        );
        stats
    }

    /// Runs the handler for a single item inside a restored flow.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Handler`] if the handler fails or panics.
    pub async fn process(&self, item: WorkItem<P>) -> FlowResult<()> {
        let snapshot = item.snapshot();
        let span = flow_span(&self.name, &snapshot);
        let handled = AssertUnwindSafe(self.handler.handle(item.into_payload())).catch_unwind();

        match AmbientContextStore::scope(snapshot, handled).instrument(span).await {
            Ok(result) => result.map_err(|e| FlowError::Handler(format!("{e:#}"))),
            Err(_) => Err(FlowError::Handler("work item handler panicked".to_string())),
        }
    }

    /// Runs the worker on the tokio runtime.
    pub fn spawn(self, cancel: Arc<CancellationToken>) -> JoinHandle<WorkerStats> {
        tokio::spawn(async move { self.run(&cancel).await })
    }
}

impl<P, H> std::fmt::Debug for BackgroundWorker<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWorker")
            .field("name", &self.name)
            .field("queue", &self.queue.name())
            .finish_non_exhaustive()
    }
}
