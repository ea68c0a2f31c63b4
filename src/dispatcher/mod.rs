//! Exception dispatch for RPC handlers
//!
//! [`RpcExceptionsHandler`] turns any exception raised by an RPC handler into
//! exactly one terminal error:
//!
//! ```text
//! exception ──▶ first matching custom filter ──▶ filter's channel
//!                     │ (none)
//!                     ▼
//!               RpcException? ── yes ──▶ payload (wrapped unless an object)
//!                     │ no
//!                     ▼
//!               log, then { status: "error", message: "Internal server error" }
//! ```
//!
//! A matching custom filter always takes precedence, including over
//! `RpcException`, and its channel is returned untouched.

use crate::channel::ErrorChannel;
use crate::config::DispatcherConfig;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::exception::{BaseRpcExceptionFilter, RegisteredFilter, RpcExceptionFilter, RpcFault};
use crate::logging::{ExceptionLogger, TracingLogger};
use crate::registry::FilterRegistry;
use std::any::Any;
use std::sync::Arc;

/// Dispatches exceptions to custom filters or the default policy
///
/// # Example
///
/// ```
/// use rpc_exceptions::prelude::*;
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let handler = RpcExceptionsHandler::builder()
///     .filter(RegisteredFilter::new(["TimeoutError"], |_, _| {
///         ErrorChannel::throw(json!({ "status": "timeout" }))
///     }))
///     .build();
///
/// let host = InvocationContext::rpc("orders.create", json!({ "sku": "A-1" }));
///
/// let error = handler.handle(RpcFault::error("TimeoutError", "db timed out"), &host).await;
/// assert_eq!(error, json!({ "status": "timeout" }));
///
/// let error = handler.handle(RpcException::new("out of stock"), &host).await;
/// assert_eq!(error, json!({ "status": "error", "message": "out of stock" }));
/// # });
/// ```
pub struct RpcExceptionsHandler {
    registry: FilterRegistry,
    fallback: BaseRpcExceptionFilter,
}

impl Default for RpcExceptionsHandler {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RpcExceptionsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RpcExceptionsHandlerBuilder {
        RpcExceptionsHandlerBuilder::new()
    }

    /// Produce the terminal error for an exception raised while handling `host`
    ///
    /// Never fails. When a custom filter matches, its channel is returned as-is
    /// and whatever happens inside it is the filter's business.
    pub fn handle(&self, exception: impl Into<RpcFault>, host: &InvocationContext) -> ErrorChannel {
        let exception = exception.into();

        if let Some(channel) = self.invoke_custom_filters(&exception, host) {
            return channel;
        }

        tracing::debug!(
            call_id = %host.call_id(),
            context_type = %host.context_type(),
            pattern = host.pattern(),
            rpc_exception = exception.as_rpc_exception().is_some(),
            "No custom exception filter matched, applying default policy"
        );
        self.fallback.catch(&exception, host)
    }

    /// Run the first matching custom filter, if any
    pub fn invoke_custom_filters(
        &self,
        exception: &RpcFault,
        host: &InvocationContext,
    ) -> Option<ErrorChannel> {
        let filter = self.registry.find_match(exception)?;
        tracing::debug!(
            call_id = %host.call_id(),
            context_type = %host.context_type(),
            pattern = host.pattern(),
            kinds = ?filter.exception_kinds(),
            "Delegating exception to custom filter"
        );
        Some(filter.invoke(exception, host))
    }

    /// Replace the custom filters at runtime
    ///
    /// See [`FilterRegistry::set_filters`] for the accepted sequence types.
    pub fn set_custom_filters<T: Any>(&self, filters: T) -> Result<()> {
        self.registry.set_filters(filters)
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }
}

/// Builder for [`RpcExceptionsHandler`]
///
/// Unless a logger is given, unknown exceptions are reported through a
/// [`TracingLogger`] using the configured logger context.
#[derive(Default)]
pub struct RpcExceptionsHandlerBuilder {
    filters: Vec<RegisteredFilter>,
    logger: Option<Arc<dyn ExceptionLogger>>,
    config: DispatcherConfig,
}

impl RpcExceptionsHandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; registration order is match order
    pub fn filter(mut self, filter: RegisteredFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = RegisteredFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn logger(mut self, logger: impl ExceptionLogger) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> RpcExceptionsHandler {
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new(self.config.logger_context.clone())));

        RpcExceptionsHandler {
            registry: FilterRegistry::with_filters(self.filters),
            fallback: BaseRpcExceptionFilter::new(logger, &self.config),
        }
    }
}
