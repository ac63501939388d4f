//! Read/write facade over the ambient context store.

use super::{AmbientContextStore, ContextIdentity, ContextSnapshot};
use crate::errors::FlowResult;
use std::any::Any;

/// Anything that can hand out the caller's current context snapshot.
///
/// The queue and the synthetic request provider depend on this seam rather
/// than on the store directly, so tests can substitute a fixed context.
#[cfg_attr(test, mockall::automock)]
pub trait ContextSource: Send + Sync {
    /// Returns the snapshot visible to the caller.
    fn snapshot(&self) -> ContextSnapshot;
}

/// Facade over the current flow's ambient context.
///
/// Reads return the flow-local snapshot; writes build a new snapshot and
/// install it, leaving every previously handed-out snapshot untouched.
/// Writes from a tokio task that is not running in a flow are discarded, see
/// [`AmbientContextStore::is_detached`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAccessor;

impl ContextAccessor {
    /// Creates a new accessor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current(&self) -> ContextSnapshot {
        AmbientContextStore::current()
    }

    /// Returns the current correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.current().correlation_id().map(str::to_string)
    }

    /// Returns the current tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> Option<String> {
        self.current().tenant_id().map(str::to_string)
    }

    /// Returns the current user id.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.current().user_id().map(str::to_string)
    }

    /// Sets the correlation id.
    pub fn set_correlation_id(&self, correlation_id: impl Into<String>) {
        let value = Some(correlation_id.into());
        AmbientContextStore::update(|s| s.with_correlation_id(value));
    }

    /// Sets the tenant id.
    pub fn set_tenant_id(&self, tenant_id: impl Into<String>) {
        let value = Some(tenant_id.into());
        AmbientContextStore::update(|s| s.with_tenant_id(value));
    }

    /// Sets the user id.
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        let value = Some(user_id.into());
        AmbientContextStore::update(|s| s.with_user_id(value));
    }

    /// Replaces all three identity fields at once, keeping extras.
    pub fn set_identity(&self, identity: ContextIdentity) {
        AmbientContextStore::update(|s| s.with_identity(identity));
    }

    /// Stores a typed extra under `key`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `key` is blank. The context is left
    /// unchanged in that case.
    pub fn set<T>(&self, key: &str, value: T) -> FlowResult<()>
    where
        T: Any + Send + Sync,
    {
        let next = self.current().with_extra(key, value)?;
        AmbientContextStore::replace(next);
        Ok(())
    }

    /// Looks up a typed extra; `None` if missing or of another type.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        self.current().get(key)
    }

    /// Removes an extra.
    pub fn remove(&self, key: &str) {
        AmbientContextStore::update(|s| s.without_extra(key));
    }

    /// Resets the current flow's context and drops any pinned request override.
    pub fn clear(&self) {
        AmbientContextStore::clear();
    }
}

impl ContextSource for ContextAccessor {
    fn snapshot(&self) -> ContextSnapshot {
        self.current()
    }
}
