//! Identity fields carried by every context snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The first-class identity of a flow: who is calling, for which tenant,
/// and under which correlation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextIdentity {
    /// The correlation (trace) id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// The tenant id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// The user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ContextIdentity {
    /// Creates an empty identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the tenant id.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correlation_id.is_none() && self.tenant_id.is_none() && self.user_id.is_none()
    }

    /// Returns true if a user or a tenant is known.
    ///
    /// Empty strings count as unknown.
    #[must_use]
    pub fn has_principal(&self) -> bool {
        non_empty(self.user_id.as_deref()).is_some() || non_empty(self.tenant_id.as_deref()).is_some()
    }

    /// Converts to a dictionary with string values (or null).
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let field = |v: &Option<String>| {
            v.as_ref()
                .map_or(serde_json::Value::Null, |s| serde_json::json!(s))
        };

        let mut map = HashMap::new();
        map.insert("correlation_id".to_string(), field(&self.correlation_id));
        map.insert("tenant_id".to_string(), field(&self.tenant_id));
        map.insert("user_id".to_string(), field(&self.user_id));
        map
    }
}

/// Treats empty strings as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
