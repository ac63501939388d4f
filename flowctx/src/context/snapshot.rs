//! Immutable context snapshots.

use super::ContextIdentity;
use crate::errors::{ensure_not_blank, FlowResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased extra value.
pub type ExtraValue = Arc<dyn Any + Send + Sync>;

/// An immutable snapshot of the ambient context.
///
/// Every "update" returns a new snapshot; the extras map is shared between
/// snapshots until one of them writes, at which point it is copied.
#[derive(Clone, Default)]
pub struct ContextSnapshot {
    identity: ContextIdentity,
    extras: Arc<HashMap<String, ExtraValue>>,
}

impl ContextSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a snapshot carrying only the given identity.
    #[must_use]
    pub fn from_identity(identity: ContextIdentity) -> Self {
        Self {
            identity,
            extras: Arc::default(),
        }
    }

    /// Returns the identity fields.
    #[must_use]
    pub fn identity(&self) -> &ContextIdentity {
        &self.identity
    }

    /// Returns the correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.identity.correlation_id.as_deref()
    }

    /// Returns the tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.identity.tenant_id.as_deref()
    }

    /// Returns the user id.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.user_id.as_deref()
    }

    /// Returns a copy with the correlation id replaced.
    #[must_use]
    pub fn with_correlation_id(&self, correlation_id: Option<String>) -> Self {
        let mut next = self.clone();
        next.identity.correlation_id = correlation_id;
        next
    }

    /// Returns a copy with the tenant id replaced.
    #[must_use]
    pub fn with_tenant_id(&self, tenant_id: Option<String>) -> Self {
        let mut next = self.clone();
        next.identity.tenant_id = tenant_id;
        next
    }

    /// Returns a copy with the user id replaced.
    #[must_use]
    pub fn with_user_id(&self, user_id: Option<String>) -> Self {
        let mut next = self.clone();
        next.identity.user_id = user_id;
        next
    }

    /// Returns a copy with all identity fields replaced, keeping extras.
    #[must_use]
    pub fn with_identity(&self, identity: ContextIdentity) -> Self {
        Self {
            identity,
            extras: Arc::clone(&self.extras),
        }
    }

    /// Returns a copy with `key` bound to `value`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `key` is blank.
    pub fn with_extra<T>(&self, key: &str, value: T) -> FlowResult<Self>
    where
        T: Any + Send + Sync,
    {
        ensure_not_blank("key", key)?;

        let mut next = self.clone();
        Arc::make_mut(&mut next.extras).insert(key.to_string(), Arc::new(value));
        Ok(next)
    }

    /// Returns a copy without `key`.
    #[must_use]
    pub fn without_extra(&self, key: &str) -> Self {
        if !self.extras.contains_key(key) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.extras).remove(key);
        next
    }

    /// Looks up an extra by key and expected type.
    ///
    /// Returns `None` if the key is missing or holds a different type.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        self.extras.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Looks up an extra without cloning the stored value.
    #[must_use]
    pub fn get_shared<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        Arc::clone(self.extras.get(key)?).downcast::<T>().ok()
    }

    /// Returns true if an extra is stored under `key`, whatever its type.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    /// Returns the extra keys in no particular order.
    #[must_use]
    pub fn extra_keys(&self) -> Vec<&str> {
        self.extras.keys().map(String::as_str).collect()
    }

    /// Returns the number of extras.
    #[must_use]
    pub fn extras_len(&self) -> usize {
        self.extras.len()
    }

    /// Returns true if neither identity nor extras are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identity.is_empty() && self.extras.is_empty()
    }
}

impl From<ContextIdentity> for ContextSnapshot {
    fn from(identity: ContextIdentity) -> Self {
        Self::from_identity(identity)
    }
}

impl fmt::Debug for ContextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.extra_keys();
        keys.sort_unstable();
        f.debug_struct("ContextSnapshot")
            .field("correlation_id", &self.identity.correlation_id)
            .field("tenant_id", &self.identity.tenant_id)
            .field("user_id", &self.identity.user_id)
            .field("extras", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FlowError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = ContextSnapshot::new();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.tenant_id(), None);
        assert_eq!(snapshot.extras_len(), 0);
    }

    #[test]
    fn test_identity_updates_leave_original_untouched() {
        let original = ContextSnapshot::new().with_tenant_id(Some("t1".to_string()));
        let updated = original.with_user_id(Some("u1".to_string()));

        assert_eq!(original.user_id(), None);
        assert_eq!(updated.user_id(), Some("u1"));
        assert_eq!(updated.tenant_id(), Some("t1"));
    }

    #[test]
    fn test_extras_copy_on_write() {
        let original = ContextSnapshot::new().with_extra("a", 1_i32).unwrap();
        let updated = original.with_extra("b", "two".to_string()).unwrap();

        assert!(!original.contains_key("b"));
        assert_eq!(updated.get::<i32>("a"), Some(1));
        assert_eq!(updated.get::<String>("b"), Some("two".to_string()));
    }

    #[test]
    fn test_get_type_mismatch_is_none() {
        let snapshot = ContextSnapshot::new().with_extra("count", 42_i32).unwrap();

        assert_eq!(snapshot.get::<i32>("count"), Some(42));
        assert_eq!(snapshot.get::<i64>("count"), None);
        assert_eq!(snapshot.get::<String>("count"), None);
        assert_eq!(snapshot.get::<i32>("missing"), None);
    }

    #[test]
    fn test_get_shared() {
        let snapshot = ContextSnapshot::new()
            .with_extra("roles", vec!["admin".to_string()])
            .unwrap();

        let roles = snapshot.get_shared::<Vec<String>>("roles").unwrap();
        assert_eq!(roles.as_slice(), ["admin".to_string()]);
        assert!(snapshot.get_shared::<String>("roles").is_none());
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = ContextSnapshot::new().with_extra("  ", 1_u8).unwrap_err();
        assert!(matches!(err, FlowError::InvalidArgument { .. }));
    }

    #[test]
    fn test_overwrite_extra_changes_type() {
        let snapshot = ContextSnapshot::new()
            .with_extra("k", 1_u8)
            .unwrap()
            .with_extra("k", "text")
            .unwrap();

        assert_eq!(snapshot.get::<u8>("k"), None);
        assert_eq!(snapshot.get::<&str>("k"), Some("text"));
        assert_eq!(snapshot.extras_len(), 1);
    }

    #[test]
    fn test_without_extra() {
        let snapshot = ContextSnapshot::new().with_extra("k", 1_u8).unwrap();
        let removed = snapshot.without_extra("k");

        assert!(snapshot.contains_key("k"));
        assert!(!removed.contains_key("k"));
    }

    #[test]
    fn test_with_identity_keeps_extras() {
        let snapshot = ContextSnapshot::new()
            .with_extra("k", 1_u8)
            .unwrap()
            .with_identity(ContextIdentity::new().with_tenant_id("t9"));

        assert_eq!(snapshot.tenant_id(), Some("t9"));
        assert_eq!(snapshot.get::<u8>("k"), Some(1));
    }

    #[test]
    fn test_debug_lists_keys_not_values() {
        let snapshot = ContextSnapshot::new()
            .with_extra("secret", "hunter2".to_string())
            .unwrap();
        let debug = format!("{snapshot:?}");

        assert!(debug.contains("secret"));
        assert!(!debug.contains("hunter2"));
    }
}
