//! Mock providers and handlers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{AmbientContextStore, ContextSnapshot};
use crate::providers::RequestContextProvider;
use crate::request::RequestContext;
use crate::worker::WorkItemHandler;

/// A provider that always returns the same value.
#[derive(Debug, Clone)]
pub struct StaticRequestProvider {
    priority: i32,
    request: Option<Arc<RequestContext>>,
}

impl StaticRequestProvider {
    /// Creates a provider returning `request`.
    #[must_use]
    pub fn new(priority: i32, request: RequestContext) -> Self {
        Self {
            priority,
            request: Some(Arc::new(request)),
        }
    }

    /// Creates a provider that never has a value.
    #[must_use]
    pub fn absent(priority: i32) -> Self {
        Self {
            priority,
            request: None,
        }
    }
}

impl RequestContextProvider for StaticRequestProvider {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn request_context(&self) -> Option<Arc<RequestContext>> {
        self.request.clone()
    }
}

/// A payload together with the ambient context its handler observed.
#[derive(Debug, Clone)]
pub struct RecordedItem<P> {
    /// The handled payload.
    pub payload: P,
    /// The ambient snapshot at the start of handling.
    pub snapshot: ContextSnapshot,
}

/// A handler that records every payload and the ambient context it ran under.
#[derive(Debug)]
pub struct RecordingHandler<P> {
    items: Mutex<Vec<RecordedItem<P>>>,
    delay: Option<Duration>,
}

impl<P> Default for RecordingHandler<P> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            delay: None,
        }
    }
}

impl<P: Clone> RecordingHandler<P> {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `delay` before recording each item.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the recorded items in handling order.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedItem<P>> {
        self.items.lock().clone()
    }

    /// Returns the number of handled items.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.items.lock().len()
    }
}

#[async_trait]
impl<P> WorkItemHandler<P> for RecordingHandler<P>
where
    P: Clone + Send + 'static,
{
    async fn handle(&self, payload: P) -> anyhow::Result<()> {
        let snapshot = AmbientContextStore::current();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.items.lock().push(RecordedItem { payload, snapshot });
        Ok(())
    }
}

/// A handler that always fails.
#[derive(Debug)]
pub struct FailingHandler {
    error: String,
    calls: Mutex<usize>,
}

impl FailingHandler {
    /// Creates a handler failing with `error`.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl<P> WorkItemHandler<P> for FailingHandler
where
    P: Send + 'static,
{
    async fn handle(&self, _payload: P) -> anyhow::Result<()> {
        *self.calls.lock() += 1;
        Err(anyhow::anyhow!("{}", self.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestIdentity;

    #[test]
    fn test_static_provider() {
        let provider = StaticRequestProvider::new(3, RequestContext::new().with_trace_identifier("x"));
        assert_eq!(provider.priority(), 3);
        assert!(provider.request_context().is_some());
        assert!(StaticRequestProvider::absent(1).request_context().is_none());
    }

    #[tokio::test]
    async fn test_recording_handler_captures_ambient() {
        let handler = RecordingHandler::new();
        TestIdentity::new()
            .run_as(handler.handle("job"))
            .await
            .unwrap();

        let recorded = handler.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].payload, "job");
        assert_eq!(recorded[0].snapshot.tenant_id(), Some("tenant-123"));
    }

    #[tokio::test]
    async fn test_failing_handler() {
        let handler = FailingHandler::new("boom");
        let result = WorkItemHandler::<u8>::handle(&handler, 1).await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert_eq!(handler.call_count(), 1);
    }
}
