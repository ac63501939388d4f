//! Default wiring of the accessor, provider chain and queues.

use crate::config::FlowConfig;
use crate::context::{ContextAccessor, ContextSource};
use crate::errors::FlowResult;
use crate::middleware::ContextMiddleware;
use crate::providers::{
    ClaimsRequestBuilder, CompositeRequestAccessor, InboundRequestProvider,
    RequestContextProvider, SyntheticRequestBuilder, SyntheticRequestProvider,
};
use crate::queue::BackgroundTaskQueue;
use std::sync::Arc;
use tracing::debug;

/// The set of shared services an application registers once at startup.
#[derive(Debug)]
pub struct ContextServices {
    config: FlowConfig,
    accessor: ContextAccessor,
    requests: Arc<CompositeRequestAccessor>,
}

impl ContextServices {
    /// Wires the default inbound and synthetic providers.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Config`](crate::errors::FlowError::Config) if
    /// `config` fails validation.
    pub fn new(config: FlowConfig) -> FlowResult<Self> {
        let builder = ClaimsRequestBuilder::from_config(&config.providers);
        Self::with_builder(config, builder, Vec::new())
    }

    /// Wires the defaults with a custom synthetic builder and extra providers.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Config`](crate::errors::FlowError::Config) if
    /// `config` fails validation.
    pub fn with_builder<B>(
        config: FlowConfig,
        builder: B,
        extra_providers: Vec<Arc<dyn RequestContextProvider>>,
    ) -> FlowResult<Self>
    where
        B: SyntheticRequestBuilder + 'static,
    {
        config.validate()?;

        let accessor = ContextAccessor::new();
        let source: Arc<dyn ContextSource> = Arc::new(accessor);

        let mut providers: Vec<Arc<dyn RequestContextProvider>> = vec![
            Arc::new(InboundRequestProvider::with_priority(
                config.providers.inbound_priority,
            )),
            Arc::new(
                SyntheticRequestProvider::with_builder(source, builder)
                    .with_priority(config.providers.synthetic_priority),
            ),
        ];
        providers.extend(extra_providers);

        let requests = Arc::new(CompositeRequestAccessor::new(providers));
        debug!(priorities = ?requests.priorities(), "Wired request context providers");

        Ok(Self {
            config,
            accessor,
            requests,
        })
    }

    /// Returns the configuration the services were built from.
    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Returns the ambient context accessor.
    #[must_use]
    pub fn accessor(&self) -> ContextAccessor {
        self.accessor
    }

    /// Returns the composite request accessor.
    #[must_use]
    pub fn requests(&self) -> Arc<CompositeRequestAccessor> {
        Arc::clone(&self.requests)
    }

    /// Returns middleware configured with the same claim types.
    #[must_use]
    pub fn middleware(&self) -> ContextMiddleware {
        ContextMiddleware::from_config(&self.config.providers)
    }

    /// Creates a queue sized by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidArgument`](crate::errors::FlowError::InvalidArgument)
    /// if the configured capacity is zero.
    pub fn create_queue<P>(&self) -> FlowResult<Arc<BackgroundTaskQueue<P>>> {
        let source: Arc<dyn ContextSource> = Arc::new(self.accessor);
        BackgroundTaskQueue::with_source(self.config.queue.clone(), source).map(Arc::new)
    }
}
