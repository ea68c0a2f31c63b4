//! # rpc-exceptions
//!
//! Exception filters and terminal error dispatch for RPC handlers.
//!
//! When an RPC handler fails, the caller must still get exactly one well-formed
//! error back. This crate decides what that error is:
//!
//! - **Custom filters**: registered in order, each catching a set of exception
//!   kinds (or everything). The first match produces the error.
//! - **`RpcException`**: errors raised on purpose carry the payload sent to the
//!   caller.
//! - **Everything else**: logged, then replaced with a generic
//!   `{ "status": "error", "message": "Internal server error" }`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rpc_exceptions::prelude::*;
//! use serde_json::json;
//!
//! // 1. Declare a filter and the exception kinds it catches
//! #[catch(TimeoutError)]
//! pub struct TimeoutFilter;
//!
//! impl RpcExceptionFilter for TimeoutFilter {
//!     fn catch(&self, _exception: &RpcFault, host: &InvocationContext) -> ErrorChannel {
//!         ErrorChannel::throw(json!({ "status": "timeout", "pattern": host.pattern() }))
//!     }
//! }
//!
//! // 2. Build the exceptions handler
//! let handler = Arc::new(
//!     RpcExceptionsHandler::builder()
//!         .filter(RegisteredFilter::from_filter(TimeoutFilter))
//!         .config(DispatcherConfig::from_config(&ConfigService::new()))
//!         .build(),
//! );
//!
//! // 3. Wrap your RPC service
//! let layer = RpcExceptionsLayer::new(handler);
//! ```

// Lets `#[catch]` expand to `::rpc_exceptions::...` inside this crate too.
extern crate self as rpc_exceptions;

pub mod channel;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod exception;
pub mod layer;
pub mod logging;
pub mod registry;

// Re-export core types
pub use channel::ErrorChannel;
pub use context::{ContextType, InvocationContext};
pub use dispatcher::{RpcExceptionsHandler, RpcExceptionsHandlerBuilder};
pub use error::{ExceptionError, Result};
pub use exception::{RegisteredFilter, RpcException, RpcFault};
pub use registry::FilterRegistry;

// Re-export macros
pub use rpc_exceptions_macro::catch;

/// Prelude module for convenient imports
///
/// ```
/// use rpc_exceptions::prelude::*;
/// ```
pub mod prelude {
    pub use crate::catch;
    pub use crate::channel::ErrorChannel;
    pub use crate::config::{ConfigService, DispatcherConfig};
    pub use crate::context::{ContextType, InvocationContext};
    pub use crate::dispatcher::{RpcExceptionsHandler, RpcExceptionsHandlerBuilder};
    pub use crate::error::{ExceptionError, Result};
    pub use crate::exception::{
        BaseRpcExceptionFilter, CatchKinds, ExceptionKind, RawException, RegisteredFilter,
        RpcException, RpcExceptionFilter, RpcFault, ThrownError,
    };
    pub use crate::layer::RpcExceptionsLayer;
    pub use crate::logging::{ExceptionLogger, TracingLogger};
    pub use crate::registry::FilterRegistry;
    pub use std::sync::Arc;
}
