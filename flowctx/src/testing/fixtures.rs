//! Test fixtures for context propagation tests.

use std::future::Future;
use std::sync::Arc;

use crate::context::{AmbientContextStore, ContextIdentity, ContextSnapshot};
use crate::request::{claim_types, ClaimsPrincipal, RequestContext};

/// Builds a snapshot holding only the given identity fields.
#[must_use]
pub fn identity_snapshot(
    tenant_id: Option<&str>,
    user_id: Option<&str>,
    correlation_id: Option<&str>,
) -> ContextSnapshot {
    ContextSnapshot::from_identity(ContextIdentity {
        correlation_id: correlation_id.map(str::to_string),
        tenant_id: tenant_id.map(str::to_string),
        user_id: user_id.map(str::to_string),
    })
}

/// A test identity builder.
///
/// Defaults to tenant `tenant-123`, user `user-456` and correlation
/// `corr-789`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestIdentity {
    /// Tenant ID.
    pub tenant_id: String,
    /// User ID.
    pub user_id: String,
    /// Correlation ID.
    pub correlation_id: String,
}

impl Default for TestIdentity {
    fn default() -> Self {
        Self {
            tenant_id: "tenant-123".to_string(),
            user_id: "user-456".to_string(),
            correlation_id: "corr-789".to_string(),
        }
    }
}

impl TestIdentity {
    /// Creates the default test identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, id: impl Into<String>) -> Self {
        self.tenant_id = id.into();
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = id.into();
        self
    }

    /// Sets the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Returns the identity as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        identity_snapshot(
            Some(&self.tenant_id),
            Some(&self.user_id),
            Some(&self.correlation_id),
        )
    }

    /// Returns an authenticated inbound request for this identity.
    #[must_use]
    pub fn inbound_request(&self) -> Arc<RequestContext> {
        let principal = ClaimsPrincipal::default()
            .with_claim(claim_types::SUBJECT, &self.user_id)
            .with_claim(claim_types::TENANT, &self.tenant_id)
            .with_authentication_type("Bearer");

        Arc::new(
            RequestContext::new()
                .with_trace_identifier(&self.correlation_id)
                .with_user(principal),
        )
    }

    /// Runs `future` in a flow seeded with this identity.
    pub async fn run_as<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        AmbientContextStore::scope(self.snapshot(), future).await
    }
}
