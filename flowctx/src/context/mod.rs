//! Ambient context management.
//!
//! This module provides:
//! - Immutable context snapshots with first-class identity fields
//! - Flow-local storage with copy-on-write inheritance
//! - An accessor facade for reading and writing the current context

mod accessor;
mod identity;
mod snapshot;
mod store;

pub use accessor::{ContextAccessor, ContextSource};
#[cfg(test)]
pub use accessor::MockContextSource;
pub use identity::ContextIdentity;
pub(crate) use identity::non_empty;
pub use snapshot::{ContextSnapshot, ExtraValue};
pub use store::AmbientContextStore;
