//! Handlers invoked for dequeued work items.

use async_trait::async_trait;
use std::future::Future;

/// Processes the payload of a work item.
///
/// Handlers run inside a flow restored from the item's captured identity, so
/// [`ContextAccessor`](crate::context::ContextAccessor) and the request
/// provider chain see the submitter's user and tenant.
#[async_trait]
pub trait WorkItemHandler<P>: Send + Sync
where
    P: Send + 'static,
{
    /// Handles one payload.
    async fn handle(&self, payload: P) -> anyhow::Result<()>;
}

/// A handler backed by an async closure.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps `func` as a handler.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P, F, Fut> WorkItemHandler<P> for FnHandler<F>
where
    P: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, payload: P) -> anyhow::Result<()> {
        (self.func)(payload).await
    }
}
