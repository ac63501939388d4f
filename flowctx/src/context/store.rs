//! Flow-local storage for the ambient context.
//!
//! A *flow* is a future (or closure) run inside [`AmbientContextStore::scope`]
//! and friends. Each flow owns a private slot stored in tokio task-local
//! storage, so it survives `.await` points and work-stealing across runtime
//! threads. Children started with [`AmbientContextStore::spawn`] receive a copy
//! of the parent's slot; later writes on either side stay private.
//!
//! Plain OS threads outside any flow fall back to a per-thread slot. That slot
//! is not reset when a thread is reused, so callers writing to it must call
//! [`AmbientContextStore::clear`] when they are done.
//!
//! A tokio task that was not started as a flow is *detached*: it has no slot
//! of its own, and sharing its worker thread's slot would leak identity
//! between unrelated tasks. Detached reads see an empty context and detached
//! writes are discarded with a warning.

use super::ContextSnapshot;
use crate::request::RequestContext;
use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Everything a flow owns privately.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlowSlot {
    /// The current snapshot.
    pub(crate) snapshot: ContextSnapshot,
    /// The real inbound request served by this flow, if any.
    pub(crate) inbound_request: Option<Arc<RequestContext>>,
    /// An explicitly pinned request context that wins over every provider.
    pub(crate) request_override: Option<Arc<RequestContext>>,
}

impl FlowSlot {
    pub(crate) fn with_snapshot(snapshot: ContextSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }
}

tokio::task_local! {
    static FLOW_SLOT: RefCell<FlowSlot>;
}

thread_local! {
    static THREAD_SLOT: RefCell<FlowSlot> = RefCell::new(FlowSlot::default());
}

/// Process-wide access point to the current flow's ambient context.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientContextStore;

impl AmbientContextStore {
    /// Returns true if the caller runs inside a flow scope.
    #[must_use]
    pub fn is_in_flow() -> bool {
        FLOW_SLOT.try_with(|_| ()).is_ok()
    }

    /// Returns the current snapshot, or an empty one.
    #[must_use]
    pub fn current() -> ContextSnapshot {
        read_slot(|slot| slot.snapshot.clone())
    }

    /// Installs `snapshot` as the current value.
    pub fn replace(snapshot: ContextSnapshot) {
        update_slot(|slot| slot.snapshot = snapshot);
    }

    /// Replaces the current snapshot with `f(current)`.
    pub fn update<F>(f: F)
    where
        F: FnOnce(&ContextSnapshot) -> ContextSnapshot,
    {
        let next = f(&Self::current());
        Self::replace(next);
    }

    /// Resets the current snapshot and any pinned request override. Idempotent.
    ///
    /// The inbound request of a serving flow stays in place; it belongs to the
    /// request being served, not to the ambient context.
    pub fn clear() {
        update_slot(|slot| {
            slot.snapshot = ContextSnapshot::new();
            slot.request_override = None;
        });
    }

    /// Returns true if the caller is a tokio task running outside any flow.
    ///
    /// Writes made from a detached task are discarded.
    #[must_use]
    pub fn is_detached() -> bool {
        matches!(locate_slot(), SlotLocation::Detached)
    }

    /// Runs `future` as a new flow seeded with `snapshot`.
    ///
    /// The new flow does not see the caller's inbound request or override.
    pub async fn scope<F>(snapshot: ContextSnapshot, future: F) -> F::Output
    where
        F: Future,
    {
        FLOW_SLOT
            .scope(RefCell::new(FlowSlot::with_snapshot(snapshot)), future)
            .await
    }

    /// Runs `future` as a new flow starting from an empty snapshot.
    pub async fn isolated<F>(future: F) -> F::Output
    where
        F: Future,
    {
        Self::scope(ContextSnapshot::new(), future).await
    }

    /// Runs `future` as a child flow holding a copy of the caller's slot.
    pub async fn inherit<F>(future: F) -> F::Output
    where
        F: Future,
    {
        let slot = read_slot(FlowSlot::clone);
        FLOW_SLOT.scope(RefCell::new(slot), future).await
    }

    /// Runs `f` synchronously as a new flow seeded with `snapshot`.
    pub fn sync_scope<R>(snapshot: ContextSnapshot, f: impl FnOnce() -> R) -> R {
        FLOW_SLOT.sync_scope(RefCell::new(FlowSlot::with_snapshot(snapshot)), f)
    }

    /// Spawns `future` on the tokio runtime as a child flow.
    ///
    /// The child starts from a copy of the caller's slot.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let slot = read_slot(FlowSlot::clone);
        tokio::spawn(FLOW_SLOT.scope(RefCell::new(slot), future))
    }

    /// Runs `f` on the blocking pool as a child flow.
    pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let slot = read_slot(FlowSlot::clone);
        tokio::task::spawn_blocking(move || FLOW_SLOT.sync_scope(RefCell::new(slot), f))
    }

    /// Runs `future` as a new flow serving `request`.
    pub(crate) async fn serve<F>(
        request: Arc<RequestContext>,
        snapshot: ContextSnapshot,
        future: F,
    ) -> F::Output
    where
        F: Future,
    {
        let slot = FlowSlot {
            snapshot,
            inbound_request: Some(request),
            request_override: None,
        };
        FLOW_SLOT.scope(RefCell::new(slot), future).await
    }

    pub(crate) fn inbound_request() -> Option<Arc<RequestContext>> {
        read_slot(|slot| slot.inbound_request.clone())
    }

    pub(crate) fn request_override() -> Option<Arc<RequestContext>> {
        read_slot(|slot| slot.request_override.clone())
    }

    pub(crate) fn set_request_override(request: Option<Arc<RequestContext>>) {
        update_slot(|slot| slot.request_override = request);
    }
}

enum SlotLocation {
    Flow,
    Thread,
    Detached,
}

fn locate_slot() -> SlotLocation {
    if AmbientContextStore::is_in_flow() {
        SlotLocation::Flow
    } else if tokio::task::try_id().is_some() {
        SlotLocation::Detached
    } else {
        SlotLocation::Thread
    }
}

fn read_slot<R>(f: impl FnOnce(&FlowSlot) -> R) -> R {
    match locate_slot() {
        SlotLocation::Flow => FLOW_SLOT.with(|cell| f(&cell.borrow())),
        SlotLocation::Thread => THREAD_SLOT.with(|cell| f(&cell.borrow())),
        SlotLocation::Detached => f(&FlowSlot::default()),
    }
}

fn update_slot(f: impl FnOnce(&mut FlowSlot)) {
    match locate_slot() {
        SlotLocation::Flow => FLOW_SLOT.with(|cell| f(&mut cell.borrow_mut())),
        SlotLocation::Thread => THREAD_SLOT.with(|cell| f(&mut cell.borrow_mut())),
        SlotLocation::Detached => {
            warn!("Discarded ambient context write from a task running outside any flow");
        }
    }
}
