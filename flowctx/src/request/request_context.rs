//! The request-shaped object handed out by the provider chain.

use super::{claim_types, ClaimsPrincipal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a request context came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOrigin {
    /// A real inbound request.
    #[default]
    Inbound,
    /// A stand-in built from an ambient snapshot.
    Synthetic,
}

/// What consumers see as "the current request".
///
/// Carries a trace identifier, an optional authenticated principal and the
/// request headers (header names are matched case-insensitively).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The trace identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_identifier: Option<String>,
    /// The authenticated principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ClaimsPrincipal>,
    /// Request headers keyed by lower-cased name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Origin of this context.
    #[serde(default)]
    pub origin: RequestOrigin,
}

impl RequestContext {
    /// Creates an empty inbound request context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty synthetic request context.
    #[must_use]
    pub fn synthetic() -> Self {
        Self {
            origin: RequestOrigin::Synthetic,
            ..Self::default()
        }
    }

    /// Sets the trace identifier.
    #[must_use]
    pub fn with_trace_identifier(mut self, trace_identifier: impl Into<String>) -> Self {
        self.trace_identifier = Some(trace_identifier.into());
        self
    }

    /// Sets the principal.
    #[must_use]
    pub fn with_user(mut self, user: ClaimsPrincipal) -> Self {
        self.user = Some(user);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the first claim of `claim_type`, if a principal is present.
    #[must_use]
    pub fn find_claim(&self, claim_type: &str) -> Option<&str> {
        self.user.as_ref()?.find_first(claim_type)
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.find_claim(claim_types::SUBJECT)
    }

    /// Returns the tenant claim.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.find_claim(claim_types::TENANT)
    }

    /// Returns true if this context was synthesized.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.origin == RequestOrigin::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = RequestContext::new().with_header("X-Tenant-Id", "t1");

        assert_eq!(request.header("x-tenant-id"), Some("t1"));
        assert_eq!(request.header("X-TENANT-ID"), Some("t1"));
        assert_eq!(request.header("x-other"), None);
    }

    #[test]
    fn test_claim_helpers() {
        let request = RequestContext::new().with_user(
            ClaimsPrincipal::default()
                .with_claim(claim_types::SUBJECT, "u1")
                .with_claim(claim_types::TENANT, "t1"),
        );

        assert_eq!(request.subject(), Some("u1"));
        assert_eq!(request.tenant(), Some("t1"));
        assert!(!request.is_synthetic());
    }

    #[test]
    fn test_anonymous_request_has_no_claims() {
        let request = RequestContext::synthetic();
        assert_eq!(request.subject(), None);
        assert!(request.is_synthetic());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let request = RequestContext::synthetic().with_trace_identifier("corr-1");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["origin"], "synthetic");
        assert_eq!(json["trace_identifier"], "corr-1");
    }
}
