//! Global subscriber installation.

use crate::config::LoggingConfig;
use crate::errors::{FlowError, FlowResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Parses the configured filter directive.
///
/// # Errors
///
/// Returns [`FlowError::Config`] if the directive is malformed.
pub fn build_filter(config: &LoggingConfig) -> FlowResult<EnvFilter> {
    EnvFilter::try_new(&config.filter)
        .map_err(|e| FlowError::Config(format!("invalid log filter `{}`: {e}", config.filter)))
}

/// Installs a global `tracing` subscriber described by `config`.
///
/// Span fields recorded by [`flow_span`](super::flow_span) appear on every
/// event emitted inside the span.
///
/// # Errors
///
/// Returns [`FlowError::Config`] if the filter is malformed or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> FlowResult<()> {
    let filter = build_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| FlowError::Config(format!("failed to install subscriber: {e}")))
}
