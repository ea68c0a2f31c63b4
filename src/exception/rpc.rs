use super::{ExceptionKind, error_lineage};
use serde_json::Value;

/// An error raised on purpose by an RPC handler
///
/// The payload is forwarded to the caller. Object payloads are sent as they
/// are; anything else is wrapped in `{ "status": "error", "message": payload }`.
///
/// ```
/// use rpc_exceptions::exception::RpcException;
/// use serde_json::json;
///
/// let exception = RpcException::new(json!({ "code": 42, "message": "Quota exceeded" }));
/// assert_eq!(exception.message(), "Quota exceeded");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct RpcException {
    payload: Value,
    message: String,
    kinds: Vec<ExceptionKind>,
}

impl RpcException {
    pub fn new(payload: impl Into<Value>) -> Self {
        let payload = payload.into();
        let message = Self::init_message(&payload);
        Self {
            payload,
            message,
            kinds: error_lineage(ExceptionKind::RPC_EXCEPTION),
        }
    }

    /// Mark the exception as an application-specific subtype so filters can
    /// target it by kind.
    pub fn with_kind(mut self, kind: impl Into<ExceptionKind>) -> Self {
        self.kinds.insert(0, kind.into());
        self
    }

    /// The payload carried to the caller
    pub fn error(&self) -> &Value {
        &self.payload
    }

    pub fn into_error(self) -> Value {
        self.payload
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kinds(&self) -> &[ExceptionKind] {
        &self.kinds
    }

    fn init_message(payload: &Value) -> String {
        match payload {
            Value::String(message) => message.clone(),
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => Self::default_message(),
            },
            _ => Self::default_message(),
        }
    }

    fn default_message() -> String {
        "Rpc Exception".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_payload() {
        assert_eq!(RpcException::new("bad input").message(), "bad input");
        assert_eq!(
            RpcException::new(json!({ "code": 42 })).message(),
            "Rpc Exception"
        );
        assert_eq!(RpcException::new(json!(404)).to_string(), "Rpc Exception");
    }

    #[test]
    fn test_subtype_kinds() {
        let exception = RpcException::new("denied").with_kind("ForbiddenRpcException");
        let kinds: Vec<&str> = exception.kinds().iter().map(ExceptionKind::as_str).collect();
        assert_eq!(kinds, ["ForbiddenRpcException", "RpcException", "Error"]);
        assert_eq!(exception.into_error(), json!("denied"));
    }
}
