//! Provider that synthesizes a request context from the ambient snapshot.

use super::{RequestContextProvider, SYNTHETIC_PRIORITY};
use crate::config::ProviderConfig;
use crate::context::{non_empty, ContextAccessor, ContextSnapshot, ContextSource};
use crate::request::{Claim, ClaimsPrincipal, RequestContext};
use std::sync::Arc;
use tracing::trace;

/// Decides whether and how to build a stand-in request from a snapshot.
pub trait SyntheticRequestBuilder: Send + Sync {
    /// Returns true if the snapshot carries enough identity to build from.
    fn can_build(&self, snapshot: &ContextSnapshot) -> bool;

    /// Builds the stand-in. Only called when `can_build` returned true.
    fn build(&self, snapshot: &ContextSnapshot) -> RequestContext;
}

/// Default builder: subject and tenant claims plus the trace identifier.
///
/// Absent or empty fields are omitted, never replaced by placeholders.
#[derive(Debug, Clone)]
pub struct ClaimsRequestBuilder {
    subject_claim: String,
    tenant_claim: String,
    authentication_type: String,
}

impl ClaimsRequestBuilder {
    /// Creates a builder with the default claim types.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ProviderConfig::default())
    }

    /// Creates a builder using the configured claim types.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            subject_claim: config.subject_claim.clone(),
            tenant_claim: config.tenant_claim.clone(),
            authentication_type: config.authentication_type.clone(),
        }
    }
}

impl Default for ClaimsRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticRequestBuilder for ClaimsRequestBuilder {
    fn can_build(&self, snapshot: &ContextSnapshot) -> bool {
        snapshot.identity().has_principal()
    }

    fn build(&self, snapshot: &ContextSnapshot) -> RequestContext {
        let mut request = RequestContext::synthetic();
        let mut claims = Vec::new();

        if let Some(user_id) = non_empty(snapshot.user_id()) {
            claims.push(Claim::new(&self.subject_claim, user_id));
        }
        if let Some(tenant_id) = non_empty(snapshot.tenant_id()) {
            claims.push(Claim::new(&self.tenant_claim, tenant_id));
        }
        if let Some(correlation_id) = non_empty(snapshot.correlation_id()) {
            request.trace_identifier = Some(correlation_id.to_string());
        }

        if !claims.is_empty() {
            request.user = Some(
                ClaimsPrincipal::new(claims).with_authentication_type(&self.authentication_type),
            );
        }

        request
    }
}

/// Builds a synthetic request from whatever the context source reports.
pub struct SyntheticRequestProvider<B = ClaimsRequestBuilder> {
    source: Arc<dyn ContextSource>,
    builder: B,
    priority: i32,
}

impl SyntheticRequestProvider<ClaimsRequestBuilder> {
    /// Creates a provider reading the ambient context with the default builder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_builder(Arc::new(ContextAccessor::new()), ClaimsRequestBuilder::new())
    }
}

impl Default for SyntheticRequestProvider<ClaimsRequestBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SyntheticRequestProvider<B>
where
    B: SyntheticRequestBuilder,
{
    /// Creates a provider from a context source and a builder.
    #[must_use]
    pub fn with_builder(source: Arc<dyn ContextSource>, builder: B) -> Self {
        Self {
            source,
            builder,
            priority: SYNTHETIC_PRIORITY,
        }
    }

    /// Overrides the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the builder.
    #[must_use]
    pub fn builder(&self) -> &B {
        &self.builder
    }
}

impl<B> RequestContextProvider for SyntheticRequestProvider<B>
where
    B: SyntheticRequestBuilder,
{
    fn priority(&self) -> i32 {
        self.priority
    }

    fn request_context(&self) -> Option<Arc<RequestContext>> {
        let snapshot = self.source.snapshot();
        if !self.builder.can_build(&snapshot) {
            return None;
        }

        trace!(
            tenant_id = ?snapshot.tenant_id(),
            user_id = ?snapshot.user_id(),
            "Building synthetic request context"
        );
        Some(Arc::new(self.builder.build(&snapshot)))
    }
}

impl<B> std::fmt::Debug for SyntheticRequestProvider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticRequestProvider")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextIdentity, MockContextSource};
    use crate::request::claim_types;
    use pretty_assertions::assert_eq;

    fn snapshot(identity: ContextIdentity) -> ContextSnapshot {
        ContextSnapshot::from_identity(identity)
    }

    #[test]
    fn test_can_build_requires_user_or_tenant() {
        let builder = ClaimsRequestBuilder::new();

        assert!(!builder.can_build(&ContextSnapshot::new()));
        assert!(!builder.can_build(&snapshot(ContextIdentity::new().with_correlation_id("c"))));
        assert!(builder.can_build(&snapshot(ContextIdentity::new().with_user_id("u"))));
        assert!(builder.can_build(&snapshot(ContextIdentity::new().with_tenant_id("t"))));
    }

    #[test]
    fn test_build_full_identity() {
        let request = ClaimsRequestBuilder::new().build(&snapshot(
            ContextIdentity::new()
                .with_user_id("user-456")
                .with_tenant_id("tenant-123")
                .with_correlation_id("corr-789"),
        ));

        assert!(request.is_synthetic());
        assert_eq!(request.subject(), Some("user-456"));
        assert_eq!(request.tenant(), Some("tenant-123"));
        assert_eq!(request.trace_identifier.as_deref(), Some("corr-789"));
        assert_eq!(
            request.user.as_ref().and_then(|u| u.authentication_type.as_deref()),
            Some("BackgroundService")
        );
    }

    #[test]
    fn test_build_omits_absent_fields() {
        let request =
            ClaimsRequestBuilder::new().build(&snapshot(ContextIdentity::new().with_tenant_id("t1")));

        let user = request.user.as_ref().unwrap();
        assert_eq!(user.claims, vec![Claim::new(claim_types::TENANT, "t1")]);
        assert_eq!(request.trace_identifier, None);
    }

    #[test]
    fn test_custom_claim_types() {
        let config = ProviderConfig::default()
            .with_subject_claim("nameidentifier")
            .with_tenant_claim("tid");
        let request = ClaimsRequestBuilder::from_config(&config).build(&snapshot(
            ContextIdentity::new().with_user_id("u").with_tenant_id("t"),
        ));

        assert_eq!(request.find_claim("nameidentifier"), Some("u"));
        assert_eq!(request.find_claim("tid"), Some("t"));
        assert_eq!(request.subject(), None);
    }

    #[test]
    fn test_provider_returns_none_without_principal() {
        let mut source = MockContextSource::new();
        source
            .expect_snapshot()
            .returning(|| ContextSnapshot::new().with_correlation_id(Some("c".to_string())));

        let provider = SyntheticRequestProvider::with_builder(Arc::new(source), ClaimsRequestBuilder::new());
        assert!(provider.request_context().is_none());
        assert_eq!(provider.priority(), SYNTHETIC_PRIORITY);
    }

    #[test]
    fn test_provider_builds_from_source() {
        let mut source = MockContextSource::new();
        source
            .expect_snapshot()
            .times(1)
            .returning(|| ContextSnapshot::new().with_user_id(Some("u1".to_string())));

        let provider = SyntheticRequestProvider::with_builder(Arc::new(source), ClaimsRequestBuilder::new())
            .with_priority(3);

        let request = provider.request_context().unwrap();
        assert_eq!(request.subject(), Some("u1"));
        assert_eq!(provider.priority(), 3);
    }
}
