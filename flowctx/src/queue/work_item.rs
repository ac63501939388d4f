//! Work items carrying a point-in-time copy of the submitter's identity.

use crate::context::{AmbientContextStore, ContextIdentity, ContextSnapshot, ContextSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A payload paired with the identity captured when it was submitted.
///
/// Fields are private: a work item never changes after construction, even if
/// the submitting flow later rewrites its ambient context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem<P> {
    payload: P,
    #[serde(flatten)]
    identity: ContextIdentity,
    created_at: DateTime<Utc>,
}

impl<P> WorkItem<P> {
    /// Captures `snapshot`'s identity alongside `payload`, stamped now.
    #[must_use]
    pub fn capture(payload: P, snapshot: &ContextSnapshot) -> Self {
        Self {
            payload,
            identity: snapshot.identity().clone(),
            created_at: Utc::now(),
        }
    }

    /// Captures whatever `source` currently reports.
    #[must_use]
    pub fn from_source(payload: P, source: &dyn ContextSource) -> Self {
        Self::capture(payload, &source.snapshot())
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the item, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Returns the captured identity.
    #[must_use]
    pub fn identity(&self) -> &ContextIdentity {
        &self.identity
    }

    /// Returns the captured correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.identity.correlation_id.as_deref()
    }

    /// Returns the captured tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.identity.tenant_id.as_deref()
    }

    /// Returns the captured user id.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.user_id.as_deref()
    }

    /// Returns when the item was submitted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns how long ago the item was submitted.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Rebuilds a snapshot holding the captured identity.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot::from_identity(self.identity.clone())
    }

    /// Runs `future` in a fresh flow seeded with the captured identity.
    ///
    /// The flow is discarded when `future` completes, successfully or not.
    pub async fn restore<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        AmbientContextStore::scope(self.snapshot(), future).await
    }
}
