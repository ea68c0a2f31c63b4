use super::{ExceptionKind, RpcFault};
use crate::channel::ErrorChannel;
use crate::context::InvocationContext;
use std::fmt;
use std::sync::Arc;

/// Handler function stored in a [`RegisteredFilter`]
pub type FilterFn = Arc<dyn Fn(&RpcFault, &InvocationContext) -> ErrorChannel + Send + Sync>;

/// The RpcExceptionFilter trait
///
/// Filters turn an exception into the error the caller receives.
/// They must always return a channel.
pub trait RpcExceptionFilter: Send + Sync + 'static {
    fn catch(&self, exception: &RpcFault, host: &InvocationContext) -> ErrorChannel;
}

/// Kinds a filter catches; usually generated by `#[catch(...)]`
///
/// An empty list catches everything.
pub trait CatchKinds {
    fn exception_kinds() -> Vec<ExceptionKind>;
}

/// A filter entry as stored by the registry
#[derive(Clone)]
pub struct RegisteredFilter {
    exception_kinds: Vec<ExceptionKind>,
    handler: FilterFn,
}

impl RegisteredFilter {
    pub fn new<I, K, F>(exception_kinds: I, handler: F) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ExceptionKind>,
        F: Fn(&RpcFault, &InvocationContext) -> ErrorChannel + Send + Sync + 'static,
    {
        Self {
            exception_kinds: exception_kinds.into_iter().map(Into::into).collect(),
            handler: Arc::new(handler),
        }
    }

    /// A filter that catches every exception
    pub fn wildcard<F>(handler: F) -> Self
    where
        F: Fn(&RpcFault, &InvocationContext) -> ErrorChannel + Send + Sync + 'static,
    {
        Self::new(Vec::<ExceptionKind>::new(), handler)
    }

    /// Register a filter struct under the kinds it declares
    pub fn from_filter<F>(filter: F) -> Self
    where
        F: RpcExceptionFilter + CatchKinds,
    {
        let filter = Arc::new(filter);
        Self {
            exception_kinds: F::exception_kinds(),
            handler: Arc::new(move |exception, host| filter.catch(exception, host)),
        }
    }

    pub fn exception_kinds(&self) -> &[ExceptionKind] {
        &self.exception_kinds
    }

    pub fn is_wildcard(&self) -> bool {
        self.exception_kinds.is_empty()
    }

    /// True for wildcards, or when one of the filter's kinds is in the
    /// exception's lineage.
    pub fn matches(&self, exception: &RpcFault) -> bool {
        self.is_wildcard()
            || self
                .exception_kinds
                .iter()
                .any(|kind| exception.is_instance_of(kind))
    }

    pub fn invoke(&self, exception: &RpcFault, host: &InvocationContext) -> ErrorChannel {
        (self.handler)(exception, host)
    }
}

impl fmt::Debug for RegisteredFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFilter")
            .field("exception_kinds", &self.exception_kinds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catch;
    use crate::exception::RpcException;
    use serde_json::{Value, json};

    #[catch(TypeError, "RangeError")]
    struct ArgumentFilter;

    impl RpcExceptionFilter for ArgumentFilter {
        fn catch(&self, exception: &RpcFault, host: &InvocationContext) -> ErrorChannel {
            ErrorChannel::throw(json!({
                "status": "invalid-argument",
                "pattern": host.pattern(),
                "kind": exception.kinds()[0].as_str(),
            }))
        }
    }

    #[catch]
    struct Everything;

    impl RpcExceptionFilter for Everything {
        fn catch(&self, _exception: &RpcFault, _host: &InvocationContext) -> ErrorChannel {
            ErrorChannel::throw(Value::Null)
        }
    }

    #[test]
    fn test_catch_macro_declares_kinds() {
        let filter = RegisteredFilter::from_filter(ArgumentFilter);
        assert_eq!(
            filter.exception_kinds(),
            [ExceptionKind::new("TypeError"), ExceptionKind::new("RangeError")]
        );
        assert!(RegisteredFilter::from_filter(Everything).is_wildcard());
    }

    #[test]
    fn test_matches_by_lineage() {
        let filter = RegisteredFilter::new(["TypeError"], |_, _| ErrorChannel::throw(Value::Null));

        assert!(filter.matches(&RpcFault::error("TypeError", "boom")));
        assert!(!filter.matches(&RpcFault::error("RangeError", "boom")));
        assert!(!filter.matches(&RpcFault::value("TypeError")));

        let by_root = RegisteredFilter::new([ExceptionKind::ERROR], |_, _| {
            ErrorChannel::throw(Value::Null)
        });
        assert!(by_root.matches(&RpcFault::error("TypeError", "boom")));
        assert!(by_root.matches(&RpcException::new("nope").into()));
        assert!(!by_root.matches(&RpcFault::value(json!({ "message": "plain" }))));
    }

    #[test]
    fn test_wildcard_matches_values() {
        let filter = RegisteredFilter::wildcard(|_, _| ErrorChannel::throw(Value::Null));
        assert!(filter.matches(&RpcFault::value(Value::Null)));
        assert!(filter.matches(&RpcFault::value(7)));
    }

    #[tokio::test]
    async fn test_invoke_passes_exception_and_context() {
        let filter = RegisteredFilter::from_filter(ArgumentFilter);
        let host = InvocationContext::rpc("math.sqrt", json!(-1));
        let exception = RpcFault::error("RangeError", "negative input");

        let error = filter.invoke(&exception, &host).await;
        assert_eq!(
            error,
            json!({ "status": "invalid-argument", "pattern": "math.sqrt", "kind": "RangeError" })
        );
    }
}
