//! Populates the ambient context from an inbound request.

use crate::config::ProviderConfig;
use crate::context::{non_empty, AmbientContextStore, ContextIdentity, ContextSnapshot};
use crate::request::RequestContext;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, Instrument};
use uuid::Uuid;

/// Runs request handlers in a flow seeded from the inbound request.
///
/// The user id comes from the subject claim, the tenant id from the tenant
/// claim with the tenant header as fallback, and the correlation id from the
/// trace identifier. Requests without a trace identifier get a fresh one.
#[derive(Debug, Clone)]
pub struct ContextMiddleware {
    subject_claim: String,
    tenant_claim: String,
    tenant_header: String,
}

impl Default for ContextMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextMiddleware {
    /// Creates middleware with the default claim types and header.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ProviderConfig::default())
    }

    /// Creates middleware using the configured claim types and header.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            subject_claim: config.subject_claim.clone(),
            tenant_claim: config.tenant_claim.clone(),
            tenant_header: config.tenant_header.clone(),
        }
    }

    /// Extracts the identity carried by `request`.
    #[must_use]
    pub fn identity_for(&self, request: &RequestContext) -> ContextIdentity {
        let user_id = non_empty(request.find_claim(&self.subject_claim)).map(str::to_string);
        let tenant_id = non_empty(request.find_claim(&self.tenant_claim))
            .or_else(|| non_empty(request.header(&self.tenant_header)))
            .map(str::to_string);
        let correlation_id = non_empty(request.trace_identifier.as_deref())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        ContextIdentity {
            correlation_id: Some(correlation_id),
            tenant_id,
            user_id,
        }
    }

    /// Runs `next` in a fresh flow for `request`.
    ///
    /// The request is visible to [`InboundRequestProvider`](crate::providers::InboundRequestProvider)
    /// for the duration of `next`; the flow is discarded afterwards whether
    /// `next` succeeded or not.
    pub async fn handle<F>(&self, request: Arc<RequestContext>, next: F) -> F::Output
    where
        F: Future,
    {
        let identity = self.identity_for(&request);
        let span = tracing::debug_span!(
            "request",
            correlation_id = identity.correlation_id.as_deref().unwrap_or_default(),
            tenant_id = identity.tenant_id.as_deref().unwrap_or_default(),
        );
        debug!(parent: &span, "Populated ambient context from inbound request");

        AmbientContextStore::serve(request, ContextSnapshot::from_identity(identity), next)
            .instrument(span)
            .await
    }
}
