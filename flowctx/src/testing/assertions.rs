//! Test assertions for captured and resolved identities.

use crate::context::ContextIdentity;
use crate::request::RequestContext;

/// Asserts that `identity` carries exactly the given fields.
///
/// # Panics
///
/// Panics if any field differs.
pub fn assert_identity(
    identity: &ContextIdentity,
    tenant_id: Option<&str>,
    user_id: Option<&str>,
    correlation_id: Option<&str>,
) {
    assert_eq!(identity.tenant_id.as_deref(), tenant_id, "tenant id mismatch");
    assert_eq!(identity.user_id.as_deref(), user_id, "user id mismatch");
    assert_eq!(
        identity.correlation_id.as_deref(),
        correlation_id,
        "correlation id mismatch"
    );
}

/// Asserts that `request` was synthesized and carries the given claims.
///
/// # Panics
///
/// Panics if the request is inbound or a claim differs.
pub fn assert_synthetic_request(
    request: &RequestContext,
    subject: Option<&str>,
    tenant: Option<&str>,
) {
    assert!(request.is_synthetic(), "Expected a synthetic request, got {request:?}");
    assert_eq!(request.subject(), subject, "subject claim mismatch");
    assert_eq!(request.tenant(), tenant, "tenant claim mismatch");
}

/// Asserts that `request` is a real inbound request.
///
/// # Panics
///
/// Panics if the request was synthesized.
pub fn assert_inbound_request(request: &RequestContext) {
    assert!(!request.is_synthetic(), "Expected an inbound request, got {request:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestIdentity;

    #[test]
    fn test_assert_identity() {
        let snapshot = TestIdentity::new().snapshot();
        assert_identity(
            snapshot.identity(),
            Some("tenant-123"),
            Some("user-456"),
            Some("corr-789"),
        );
    }

    #[test]
    #[should_panic(expected = "tenant id mismatch")]
    fn test_assert_identity_fails() {
        assert_identity(&ContextIdentity::new(), Some("x"), None, None);
    }

    #[test]
    fn test_assert_inbound_request() {
        assert_inbound_request(&TestIdentity::new().inbound_request());
    }

    #[test]
    #[should_panic(expected = "Expected a synthetic request")]
    fn test_assert_synthetic_request_fails_for_inbound() {
        assert_synthetic_request(&RequestContext::new(), None, None);
    }
}
