//! Exceptions raised while processing RPC calls
//!
//! Every value that crosses into the exceptions handler is turned into an
//! [`RpcFault`]. A fault is either an [`RpcException`], an error the handler
//! raised on purpose, or an uncategorized [`RawException`] that is kept as-is
//! for logging.
//!
//! Exceptions carry an ordered lineage of [`ExceptionKind`] tags, most specific
//! first. Filters declare the kinds they catch and match when any of their
//! kinds appears in an exception's lineage.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub mod base;
pub mod filter;
pub mod rpc;

pub use base::BaseRpcExceptionFilter;
pub use filter::{CatchKinds, FilterFn, RegisteredFilter, RpcExceptionFilter};
pub use rpc::RpcException;

/// Tag identifying a family of exceptions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExceptionKind(Cow<'static, str>);

impl ExceptionKind {
    /// Root of every error object lineage
    pub const ERROR: Self = Self(Cow::Borrowed("Error"));
    pub const RPC_EXCEPTION: Self = Self(Cow::Borrowed("RpcException"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ExceptionKind {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ExceptionKind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Builds a lineage ending in `Error`, without repeating it.
fn error_lineage(kind: ExceptionKind) -> Vec<ExceptionKind> {
    if kind == ExceptionKind::ERROR {
        vec![ExceptionKind::ERROR]
    } else {
        vec![kind, ExceptionKind::ERROR]
    }
}

/// An error object that was not raised as an [`RpcException`]
///
/// Handlers can return it through `anyhow` to keep its kinds visible to
/// filters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", summary(.kinds, .message))]
pub struct ThrownError {
    kinds: Vec<ExceptionKind>,
    message: String,
    trace: Option<String>,
}

impl ThrownError {
    /// `kind` becomes the most specific entry of the lineage, followed by `Error`.
    pub fn new(kind: impl Into<ExceptionKind>, message: impl Into<String>) -> Self {
        Self {
            kinds: error_lineage(kind.into()),
            message: message.into(),
            trace: None,
        }
    }

    /// Mark the error as a more specific subtype of its current kind.
    pub fn with_kind(mut self, kind: impl Into<ExceptionKind>) -> Self {
        self.kinds.insert(0, kind.into());
        self
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn kind(&self) -> &ExceptionKind {
        &self.kinds[0]
    }

    pub fn kinds(&self) -> &[ExceptionKind] {
        &self.kinds
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

fn summary(kinds: &[ExceptionKind], message: &str) -> String {
    if message.is_empty() {
        kinds[0].to_string()
    } else {
        format!("{}: {}", kinds[0], message)
    }
}

/// Anything thrown that is not an [`RpcException`]
#[derive(Debug, Clone, PartialEq)]
pub enum RawException {
    /// An error object with a kind, message and optional trace
    Error(ThrownError),
    /// An arbitrary thrown value: string, number, plain object, null...
    Value(Value),
}

impl RawException {
    /// Plain values are instances of nothing; only wildcard filters catch them.
    pub fn kinds(&self) -> &[ExceptionKind] {
        match self {
            RawException::Error(error) => error.kinds(),
            RawException::Value(_) => &[],
        }
    }
}

/// An exception as seen by the exceptions handler
#[derive(Debug, Clone, PartialEq)]
pub enum RpcFault {
    Rpc(RpcException),
    Uncategorized(RawException),
}

impl RpcFault {
    /// Shorthand for an uncategorized error object of the given kind
    pub fn error(kind: impl Into<ExceptionKind>, message: impl Into<String>) -> Self {
        Self::Uncategorized(RawException::Error(ThrownError::new(kind, message)))
    }

    /// Shorthand for an arbitrary thrown value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Uncategorized(RawException::Value(value.into()))
    }

    pub fn kinds(&self) -> &[ExceptionKind] {
        match self {
            RpcFault::Rpc(exception) => exception.kinds(),
            RpcFault::Uncategorized(raw) => raw.kinds(),
        }
    }

    pub fn is_instance_of(&self, kind: &ExceptionKind) -> bool {
        self.kinds().contains(kind)
    }

    pub fn as_rpc_exception(&self) -> Option<&RpcException> {
        match self {
            RpcFault::Rpc(exception) => Some(exception),
            RpcFault::Uncategorized(_) => None,
        }
    }
}

impl From<RpcException> for RpcFault {
    fn from(exception: RpcException) -> Self {
        Self::Rpc(exception)
    }
}

impl From<ThrownError> for RpcFault {
    fn from(error: ThrownError) -> Self {
        Self::Uncategorized(RawException::Error(error))
    }
}

impl From<RawException> for RpcFault {
    fn from(raw: RawException) -> Self {
        Self::Uncategorized(raw)
    }
}

impl From<Value> for RpcFault {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

/// Renders the causes of an error, one `Caused by:` line each.
fn cause_trace(error: &(dyn Error + 'static)) -> Option<String> {
    let causes: Vec<String> = std::iter::successors(error.source(), |&e| e.source())
        .map(|cause| format!("Caused by: {}", cause))
        .collect();
    (!causes.is_empty()).then(|| causes.join("\n"))
}

impl From<anyhow::Error> for RpcFault {
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<RpcException>() {
            Ok(exception) => return Self::Rpc(exception),
            Err(error) => error,
        };
        match error.downcast::<ThrownError>() {
            Ok(thrown) => thrown.into(),
            Err(error) => {
                let mut trace = cause_trace(&*error);
                let backtrace = error.backtrace();
                if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                    let backtrace = backtrace.to_string();
                    trace = Some(match trace {
                        Some(causes) => format!("{}\n{}", causes, backtrace),
                        None => backtrace,
                    });
                }

                let mut thrown = ThrownError::new(ExceptionKind::ERROR, error.to_string());
                thrown.trace = trace;
                thrown.into()
            }
        }
    }
}

impl From<Box<dyn Error + Send + Sync>> for RpcFault {
    fn from(error: Box<dyn Error + Send + Sync>) -> Self {
        let error = match error.downcast::<RpcException>() {
            Ok(exception) => return Self::Rpc(*exception),
            Err(error) => error,
        };
        match error.downcast::<ThrownError>() {
            Ok(thrown) => (*thrown).into(),
            Err(error) => {
                let mut thrown = ThrownError::new(ExceptionKind::ERROR, error.to_string());
                thrown.trace = cause_trace(&*error);
                thrown.into()
            }
        }
    }
}
