//! # Flowctx
//!
//! Ambient request-context propagation for async Rust services.
//!
//! Flowctx keeps "who is calling, for which tenant, under which correlation
//! id" available to any code running in a logical flow, and carries it across
//! the gap to background work:
//!
//! - **Ambient context**: an immutable [`ContextSnapshot`](context::ContextSnapshot)
//!   per flow, inherited by child tasks with copy-on-write isolation
//! - **Request resolution**: a priority-ordered provider chain that returns
//!   the real inbound request or synthesizes one from the ambient identity
//! - **Background queue**: a bounded FIFO that captures the submitter's
//!   identity with every payload
//! - **Workers**: consumers that replay each item under its captured identity
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowctx::prelude::*;
//!
//! let services = ContextServices::new(FlowConfig::default())?;
//! let queue = services.create_queue::<SendEmail>()?;
//!
//! // In a request handler:
//! services
//!     .middleware()
//!     .handle(request, async { queue.enqueue(SendEmail::welcome()).await })
//!     .await?;
//!
//! // In the background:
//! let stats = BackgroundWorker::new(queue, EmailHandler::new())
//!     .run(&shutdown)
//!     .await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod middleware;
pub mod observability;
pub mod providers;
pub mod queue;
pub mod request;
pub mod services;
pub mod testing;
pub mod worker;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{FlowConfig, LoggingConfig, ProviderConfig, QueueConfig};
    pub use crate::context::{
        AmbientContextStore, ContextAccessor, ContextIdentity, ContextSnapshot, ContextSource,
    };
    pub use crate::errors::{FlowError, FlowResult};
    pub use crate::middleware::ContextMiddleware;
    pub use crate::observability::{flow_span, init_tracing};
    pub use crate::providers::{
        ClaimsRequestBuilder, CompositeRequestAccessor, InboundRequestProvider,
        RequestContextProvider, SyntheticRequestBuilder, SyntheticRequestProvider,
    };
    pub use crate::queue::{BackgroundTaskQueue, WorkItem};
    pub use crate::request::{ClaimsPrincipal, RequestContext};
    pub use crate::services::ContextServices;
    pub use crate::worker::{BackgroundWorker, WorkItemHandler, WorkerStats};
}
