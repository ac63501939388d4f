//! Tracing integration for ambient context.
//!
//! Spans opened through [`flow_span`] carry the identity fields of a
//! snapshot so log lines emitted while a work item runs can be attributed to
//! the originating tenant and request.

use crate::context::ContextSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Span;

/// Span attributes derived from a context snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSpanAttributes {
    /// Operation name.
    pub operation: Option<String>,
    /// Correlation ID.
    pub correlation_id: Option<String>,
    /// Tenant ID.
    pub tenant_id: Option<String>,
    /// User ID.
    pub user_id: Option<String>,
}

impl ContextSpanAttributes {
    /// Creates empty span attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the identity fields of `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &ContextSnapshot) -> Self {
        Self {
            operation: None,
            correlation_id: snapshot.correlation_id().map(str::to_string),
            tenant_id: snapshot.tenant_id().map(str::to_string),
            user_id: snapshot.user_id().map(str::to_string),
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Converts to OpenTelemetry attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.operation {
            attrs.insert("operation.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.correlation_id {
            attrs.insert("correlation.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.tenant_id {
            attrs.insert("tenant.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.user_id {
            attrs.insert("enduser.id".to_string(), v.clone());
        }

        attrs
    }
}

/// Opens an info-level span tagged with `snapshot`'s identity.
#[must_use]
pub fn flow_span(operation: &str, snapshot: &ContextSnapshot) -> Span {
    tracing::info_span!(
        "flow",
        operation,
        correlation_id = snapshot.correlation_id().unwrap_or_default(),
        tenant_id = snapshot.tenant_id().unwrap_or_default(),
        user_id = snapshot.user_id().unwrap_or_default(),
    )
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextIdentity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attributes_from_snapshot() {
        let snapshot = ContextSnapshot::from_identity(
            ContextIdentity::new()
                .with_tenant_id("tenant-123")
                .with_user_id("user-456"),
        );

        let otel = ContextSpanAttributes::from_snapshot(&snapshot)
            .with_operation("send_email")
            .to_otel_attributes();

        assert_eq!(otel.get("tenant.id"), Some(&"tenant-123".to_string()));
        assert_eq!(otel.get("enduser.id"), Some(&"user-456".to_string()));
        assert_eq!(otel.get("operation.name"), Some(&"send_email".to_string()));
        assert!(!otel.contains_key("correlation.id"));
    }

    #[test]
    fn test_empty_snapshot_has_no_attributes() {
        let attrs = ContextSpanAttributes::from_snapshot(&ContextSnapshot::new());
        assert_eq!(attrs, ContextSpanAttributes::new());
        assert!(attrs.to_otel_attributes().is_empty());
    }

    #[test]
    fn test_flow_span_without_subscriber() {
        let span = flow_span("noop", &ContextSnapshot::new());
        let _entered = span.enter();
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("test_span");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "test_span");
        let duration = timer.finish();
        assert!(duration >= 10.0);
    }
}
