//! The provider capability.

use crate::request::RequestContext;
use std::sync::Arc;

/// Something that may be able to produce the current request context.
///
/// Implementations signal "cannot provide" by returning `None`; they must not
/// panic, since the composite does not catch provider failures.
#[cfg_attr(test, mockall::automock)]
pub trait RequestContextProvider: Send + Sync {
    /// Returns the provider's priority (lower = consulted earlier).
    fn priority(&self) -> i32;

    /// Attempts to produce a request context.
    fn request_context(&self) -> Option<Arc<RequestContext>>;
}
