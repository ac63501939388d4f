//! Error types for the flowctx crate.
//!
//! Absence is never an error here: unset context keys, unresolvable request
//! contexts and empty queues are reported as `None`. The variants below cover
//! contract violations, cancellation and queue shutdown only.

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type FlowResult<T> = Result<T, FlowError>;

/// The main error type for flowctx operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    /// A caller violated an argument contract (blank key, zero capacity, ...).
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        /// The offending argument name.
        argument: String,
        /// Why the argument was rejected.
        reason: String,
    },

    /// A suspended operation was abandoned because its token fired.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The queue no longer accepts or yields items.
    #[error("Queue `{0}` is closed")]
    QueueClosed(String),

    /// A work item handler failed.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error from a token reason.
    #[must_use]
    pub fn cancelled(reason: Option<String>) -> Self {
        Self::Cancelled(reason.unwrap_or_else(|| "cancellation requested".to_string()))
    }

    /// Returns true if this error stems from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if the operation may succeed when retried.
    ///
    /// Contract violations and closed queues never recover.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::Handler(_))
    }
}

/// Rejects blank or whitespace-only strings.
pub(crate) fn ensure_not_blank(argument: &str, value: &str) -> FlowResult<()> {
    if value.trim().is_empty() {
        return Err(FlowError::invalid_argument(
            argument,
            "must not be empty or whitespace",
        ));
    }
    Ok(())
}
