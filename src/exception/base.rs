use super::filter::{CatchKinds, RpcExceptionFilter};
use super::{ExceptionKind, RawException, RpcException, RpcFault};
use crate::channel::ErrorChannel;
use crate::config::DispatcherConfig;
use crate::context::InvocationContext;
use crate::logging::{ExceptionLogger, TracingLogger};
use serde_json::{Value, json};
use std::sync::Arc;

/// Status carried by every error payload built here
pub const ERROR_STATUS: &str = "error";

/// The default exception policy, usable as a filter of its own
///
/// - `RpcException` payloads that are objects are sent unchanged, anything
///   else is wrapped as `{ "status": "error", "message": payload }`.
/// - Every other exception is logged and replaced with
///   `{ "status": "error", "message": "Internal server error" }`.
///
/// Custom filters can hold one and delegate to it for the cases they do not
/// want to handle themselves.
#[derive(Clone)]
pub struct BaseRpcExceptionFilter {
    logger: Arc<dyn ExceptionLogger>,
    unknown_exception_message: String,
}

impl Default for BaseRpcExceptionFilter {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger::default()), &DispatcherConfig::default())
    }
}

impl BaseRpcExceptionFilter {
    pub fn new(logger: Arc<dyn ExceptionLogger>, config: &DispatcherConfig) -> Self {
        Self {
            logger,
            unknown_exception_message: config.unknown_exception_message.clone(),
        }
    }

    /// Compute the terminal error for `exception`, logging it if it is unknown.
    pub fn resolve(&self, exception: &RpcFault) -> Value {
        match exception {
            RpcFault::Rpc(exception) => rpc_error_payload(exception),
            RpcFault::Uncategorized(raw) => {
                self.log_unknown(raw);
                json!({ "status": ERROR_STATUS, "message": self.unknown_exception_message })
            }
        }
    }

    fn log_unknown(&self, raw: &RawException) {
        match raw {
            RawException::Error(error) if !error.message().is_empty() => {
                self.logger.error(error.message(), error.trace());
            }
            RawException::Error(error) => self.logger.error(&error.to_string(), None),
            RawException::Value(Value::Object(object))
                if object.get("message").is_some_and(is_truthy) =>
            {
                let message = object.get("message").map(render).unwrap_or_default();
                let stack = object.get("stack").and_then(Value::as_str);
                self.logger.error(&message, stack);
            }
            RawException::Value(value) => self.logger.error(&render(value), None),
        }
    }
}

impl RpcExceptionFilter for BaseRpcExceptionFilter {
    fn catch(&self, exception: &RpcFault, _host: &InvocationContext) -> ErrorChannel {
        ErrorChannel::throw(self.resolve(exception))
    }
}

impl CatchKinds for BaseRpcExceptionFilter {
    fn exception_kinds() -> Vec<ExceptionKind> {
        Vec::new()
    }
}

/// Object payloads (maps and arrays) pass through, everything else is wrapped.
pub fn rpc_error_payload(exception: &RpcException) -> Value {
    match exception.error() {
        payload @ (Value::Object(_) | Value::Array(_)) => payload.clone(),
        payload => json!({ "status": ERROR_STATUS, "message": payload }),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings are logged bare, everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
