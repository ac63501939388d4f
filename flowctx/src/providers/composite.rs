//! Priority-ordered composition of request context providers.

use super::RequestContextProvider;
use crate::context::AmbientContextStore;
use crate::request::RequestContext;
use std::sync::Arc;
use tracing::trace;

/// Resolves "the current request" by asking providers in priority order.
///
/// An override pinned with [`set_override`](Self::set_override) wins over every
/// provider. The override lives in the current flow's slot, so pinning it in
/// one flow never affects another.
pub struct CompositeRequestAccessor {
    providers: Vec<Arc<dyn RequestContextProvider>>,
}

impl CompositeRequestAccessor {
    /// Creates an accessor over `providers`.
    ///
    /// Providers are stably sorted by ascending priority, so equal priorities
    /// keep their registration order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn RequestContextProvider>>) -> Self {
        let mut providers = providers;
        providers.sort_by_key(|p| p.priority());
        Self { providers }
    }

    /// Creates an accessor with no providers.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Adds a provider, keeping the priority order.
    pub fn add(&mut self, provider: Arc<dyn RequestContextProvider>) {
        self.providers.push(provider);
        self.providers.sort_by_key(|p| p.priority());
    }

    /// Returns the current request context, if anything can provide one.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<RequestContext>> {
        if let Some(pinned) = AmbientContextStore::request_override() {
            trace!("Resolved request context from override");
            return Some(pinned);
        }

        for provider in &self.providers {
            if let Some(request) = provider.request_context() {
                trace!(priority = provider.priority(), "Resolved request context");
                return Some(request);
            }
        }

        None
    }

    /// Pins `request` for the current flow.
    pub fn set_override(&self, request: Arc<RequestContext>) {
        AmbientContextStore::set_request_override(Some(request));
    }

    /// Removes the pinned request for the current flow.
    pub fn clear_override(&self) {
        AmbientContextStore::set_request_override(None);
    }

    /// Returns the pinned request for the current flow.
    #[must_use]
    pub fn override_value(&self) -> Option<Arc<RequestContext>> {
        AmbientContextStore::request_override()
    }

    /// Returns the provider priorities in consultation order.
    #[must_use]
    pub fn priorities(&self) -> Vec<i32> {
        self.providers.iter().map(|p| p.priority()).collect()
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for CompositeRequestAccessor {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for CompositeRequestAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeRequestAccessor")
            .field("priorities", &self.priorities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockRequestContextProvider;
    use pretty_assertions::assert_eq;

    fn provider(priority: i32, trace: Option<&'static str>) -> Arc<dyn RequestContextProvider> {
        let mut mock = MockRequestContextProvider::new();
        mock.expect_priority().return_const(priority);
        mock.expect_request_context().returning(move || {
            trace.map(|t| Arc::new(RequestContext::new().with_trace_identifier(t)))
        });
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_providers_sorted_by_priority() {
        let accessor = CompositeRequestAccessor::new(vec![
            provider(10, None),
            provider(-5, None),
            provider(3, None),
        ]);

        assert_eq!(accessor.priorities(), vec![-5, 3, 10]);
    }

    #[tokio::test]
    async fn test_lowest_priority_with_value_wins() {
        let accessor = CompositeRequestAccessor::new(vec![
            provider(10, Some("ten")),
            provider(0, Some("zero")),
        ]);

        AmbientContextStore::isolated(async {
            let resolved = accessor.resolve().unwrap();
            assert_eq!(resolved.trace_identifier.as_deref(), Some("zero"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_equal_priorities_keep_registration_order() {
        let mut accessor = CompositeRequestAccessor::new(vec![provider(1, Some("first"))]);
        accessor.add(provider(1, Some("second")));

        AmbientContextStore::isolated(async {
            let resolved = accessor.resolve().unwrap();
            assert_eq!(resolved.trace_identifier.as_deref(), Some("first"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_stops_at_first_value() {
        let mut untouched = MockRequestContextProvider::new();
        untouched.expect_priority().return_const(50);
        untouched.expect_request_context().never();

        let accessor = CompositeRequestAccessor::new(vec![
            Arc::new(untouched),
            provider(0, Some("hit")),
        ]);

        AmbientContextStore::isolated(async {
            assert!(accessor.resolve().is_some());
        })
        .await;
    }

    #[tokio::test]
    async fn test_empty_accessor_resolves_none() {
        let accessor = CompositeRequestAccessor::empty();
        assert!(accessor.is_empty());

        AmbientContextStore::isolated(async {
            assert!(accessor.resolve().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn test_override_is_flow_local() {
        let accessor = Arc::new(CompositeRequestAccessor::empty());

        AmbientContextStore::isolated(async {
            accessor.set_override(Arc::new(RequestContext::new().with_trace_identifier("pinned")));

            let other = Arc::clone(&accessor);
            let seen_elsewhere = tokio::spawn(AmbientContextStore::isolated(async move {
                other.resolve()
            }))
            .await
            .unwrap();
            assert!(seen_elsewhere.is_none());

            assert_eq!(
                accessor.resolve().unwrap().trace_identifier.as_deref(),
                Some("pinned")
            );

            accessor.clear_override();
            assert!(accessor.override_value().is_none());
            assert!(accessor.resolve().is_none());
        })
        .await;
    }

    #[test]
    fn test_context_clear_drops_override_on_plain_thread() {
        std::thread::spawn(|| {
            let accessor = CompositeRequestAccessor::new(vec![provider(0, None)]);
            accessor.set_override(Arc::new(RequestContext::new().with_trace_identifier("pinned")));
            assert!(accessor.resolve().is_some());

            crate::context::ContextAccessor::new().clear();

            assert!(accessor.override_value().is_none());
            assert!(accessor.resolve().is_none());
        })
        .join()
        .unwrap();
    }
}
