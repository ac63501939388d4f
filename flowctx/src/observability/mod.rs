//! Observability utilities.

mod subscriber;
mod tracing;

pub use self::subscriber::{build_filter, init_tracing};
pub use self::tracing::{flow_span, ContextSpanAttributes, SpanTimer};
