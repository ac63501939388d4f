//! The request-shaped object produced by the provider chain.

mod claims;
mod request_context;

pub use claims::{claim_types, Claim, ClaimsPrincipal};
pub use request_context::{RequestContext, RequestOrigin};
