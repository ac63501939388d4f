//! Background workers restoring captured context around each work item.

mod background;
mod handler;

pub use background::{BackgroundWorker, WorkerStats};
pub use handler::{FnHandler, WorkItemHandler};
