//! Cooperative cancellation for suspending operations.

mod token;

pub use token::{CancelCallback, CancellationToken};
