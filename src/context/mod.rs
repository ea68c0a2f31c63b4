use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// The kind of transport an invocation arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Rpc,
    Http,
    Ws,
}

/// Metadata describing the call site of an RPC invocation
///
/// The exceptions handler never looks inside; it hands the context to
/// whichever filter handles the exception. Cloning is cheap. Serializes to
/// its metadata; the transport handle is left out.
#[derive(Clone, Serialize)]
pub struct InvocationContext {
    call_id: Uuid,
    context_type: ContextType,
    pattern: String,
    data: Value,
    received_at: DateTime<Utc>,
    #[serde(skip)]
    transport: Option<Arc<dyn Any + Send + Sync>>,
}

impl InvocationContext {
    /// Context for an RPC message matched against `pattern`
    pub fn rpc(pattern: impl Into<String>, data: Value) -> Self {
        Self::new(ContextType::Rpc, pattern, data)
    }

    pub fn new(context_type: ContextType, pattern: impl Into<String>, data: Value) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            context_type,
            pattern: pattern.into(),
            data,
            received_at: Utc::now(),
            transport: None,
        }
    }

    /// Attach the underlying transport handle (connection, channel, client, ...)
    pub fn with_transport<T: Any + Send + Sync>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn context_type(&self) -> ContextType {
        self.context_type
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Arguments the handler was invoked with
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The transport handle, if one of type `T` was attached
    pub fn transport<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.transport.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("call_id", &self.call_id)
            .field("context_type", &self.context_type)
            .field("pattern", &self.pattern)
            .field("data", &self.data)
            .field("received_at", &self.received_at)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}
