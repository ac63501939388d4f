//! Request context providers and their priority-ordered composition.
//!
//! Consumers written against "the current request" query a
//! [`CompositeRequestAccessor`]. Inside a real request the inbound request
//! wins (priority 0); elsewhere, such as in a background worker that restored
//! a captured identity, a synthetic request is built from the ambient
//! snapshot (priority 10).

mod composite;
mod inbound;
mod provider;
mod synthetic;

pub use composite::CompositeRequestAccessor;
pub use inbound::InboundRequestProvider;
#[cfg(test)]
pub use provider::MockRequestContextProvider;
pub use provider::RequestContextProvider;
pub use synthetic::{ClaimsRequestBuilder, SyntheticRequestBuilder, SyntheticRequestProvider};

/// Priority reserved for the real inbound request.
pub const INBOUND_PRIORITY: i32 = 0;
/// Priority of the snapshot-backed fallback.
pub const SYNTHETIC_PRIORITY: i32 = 10;
