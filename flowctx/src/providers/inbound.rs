//! Provider backed by the real inbound request.

use super::{RequestContextProvider, INBOUND_PRIORITY};
use crate::context::AmbientContextStore;
use crate::request::RequestContext;
use std::sync::Arc;

/// Returns the inbound request served by the current flow, unchanged.
///
/// Yields `None` outside a request, e.g. in a background worker.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequestProvider {
    priority: i32,
}

impl InboundRequestProvider {
    /// Creates the provider at the default priority.
    #[must_use]
    pub fn new() -> Self {
        Self::with_priority(INBOUND_PRIORITY)
    }

    /// Creates the provider at a custom priority.
    #[must_use]
    pub fn with_priority(priority: i32) -> Self {
        Self { priority }
    }
}

impl Default for InboundRequestProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContextProvider for InboundRequestProvider {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn request_context(&self) -> Option<Arc<RequestContext>> {
        AmbientContextStore::inbound_request()
    }
}
