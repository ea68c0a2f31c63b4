use crate::context::InvocationContext;
use crate::dispatcher::RpcExceptionsHandler;
use crate::exception::RpcFault;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// Tower Layer routing handler errors through an [`RpcExceptionsHandler`]
///
/// The wrapped service receives the [`InvocationContext`] of the call. Any
/// error it returns, or fails to become ready with, comes back as the
/// terminal error value produced by the exceptions handler.
#[derive(Clone)]
pub struct RpcExceptionsLayer {
    handler: Arc<RpcExceptionsHandler>,
}

impl RpcExceptionsLayer {
    pub fn new(handler: Arc<RpcExceptionsHandler>) -> Self {
        Self { handler }
    }
}

impl<S> Layer<S> for RpcExceptionsLayer {
    type Service = RpcExceptionsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcExceptionsMiddleware {
            inner,
            handler: Arc::clone(&self.handler),
        }
    }
}

#[derive(Clone)]
pub struct RpcExceptionsMiddleware<S> {
    inner: S,
    handler: Arc<RpcExceptionsHandler>,
}

impl<S> Service<InvocationContext> for RpcExceptionsMiddleware<S>
where
    S: Service<InvocationContext, Response = Value> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<RpcFault> + Send,
{
    type Response = Value;
    type Error = Value;
    type Future = BoxFuture<'static, Result<Value, Value>>;

    // Readiness of the inner service is awaited per call, so readiness
    // failures reach the exceptions handler together with the call's context.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, host: InvocationContext) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let inner = self.inner.clone();

        Box::pin(async move {
            match inner.oneshot(host.clone()).await {
                Ok(response) => Ok(response),
                Err(error) => Err(handler.handle(error, &host).await),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ErrorChannel;
    use crate::exception::{RegisteredFilter, RpcException, ThrownError};
    use anyhow::anyhow;
    use futures::future::{self, Ready};
    use serde_json::json;
    use tower::{ServiceBuilder, service_fn};

    async fn find_user(host: InvocationContext) -> anyhow::Result<Value> {
        match host.data()["id"].as_i64() {
            Some(1) => Ok(json!({ "id": 1, "name": "Ada" })),
            Some(2) => Err(RpcException::new(json!({ "code": 404, "message": "User not found" })).into()),
            Some(3) => Err(RpcException::new("id 3 is reserved").with_kind("ReservedIdError").into()),
            Some(4) => Err(ThrownError::new("TimeoutError", "user store timed out").into()),
            _ => Err(anyhow!("invalid id: {}", host.data()["id"])),
        }
    }

    fn service(handler: RpcExceptionsHandler) -> impl Service<InvocationContext, Response = Value, Error = Value> {
        ServiceBuilder::new()
            .layer(RpcExceptionsLayer::new(Arc::new(handler)))
            .service(service_fn(find_user))
    }

    fn call_with(id: Value) -> InvocationContext {
        InvocationContext::rpc("users.find", json!({ "id": id }))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = service(RpcExceptionsHandler::new())
            .oneshot(call_with(json!(1)))
            .await
            .unwrap();
        assert_eq!(response, json!({ "id": 1, "name": "Ada" }));
    }

    #[tokio::test]
    async fn test_rpc_exception_becomes_payload() {
        let error = service(RpcExceptionsHandler::new())
            .oneshot(call_with(json!(2)))
            .await
            .unwrap_err();
        assert_eq!(error, json!({ "code": 404, "message": "User not found" }));
    }

    #[tokio::test]
    async fn test_unknown_error_becomes_generic() {
        let error = service(RpcExceptionsHandler::new())
            .oneshot(call_with(json!("abc")))
            .await
            .unwrap_err();
        assert_eq!(error, json!({ "status": "error", "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_custom_filter_through_layer() {
        let handler = RpcExceptionsHandler::builder()
            .filter(RegisteredFilter::new(["ReservedIdError"], |exception, host| {
                ErrorChannel::throw(json!({
                    "status": "reserved",
                    "message": exception.as_rpc_exception().map(|e| e.message().to_string()),
                    "pattern": host.pattern(),
                }))
            }))
            .build();

        let error = service(handler).oneshot(call_with(json!(3))).await.unwrap_err();
        assert_eq!(
            error,
            json!({ "status": "reserved", "message": "id 3 is reserved", "pattern": "users.find" })
        );
    }

    #[tokio::test]
    async fn test_kinded_error_reaches_filter() {
        let handler = RpcExceptionsHandler::builder()
            .filter(RegisteredFilter::new(["TimeoutError"], |exception, _| {
                ErrorChannel::throw(json!({
                    "status": "timeout",
                    "kind": exception.kinds()[0].as_str(),
                }))
            }))
            .build();

        let error = service(handler).oneshot(call_with(json!(4))).await.unwrap_err();
        assert_eq!(error, json!({ "status": "timeout", "kind": "TimeoutError" }));
    }

    #[derive(Clone)]
    struct Offline;

    impl Service<InvocationContext> for Offline {
        type Response = Value;
        type Error = anyhow::Error;
        type Future = Ready<anyhow::Result<Value>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Err(ThrownError::new("UnavailableError", "backend offline").into()))
        }

        fn call(&mut self, _host: InvocationContext) -> Self::Future {
            future::ready(Ok(Value::Null))
        }
    }

    #[tokio::test]
    async fn test_readiness_failure_reaches_handler() {
        let handler = RpcExceptionsHandler::builder()
            .filter(RegisteredFilter::new(["UnavailableError"], |_, host| {
                ErrorChannel::throw(json!({ "status": "unavailable", "pattern": host.pattern() }))
            }))
            .build();
        let mut service = RpcExceptionsLayer::new(Arc::new(handler)).layer(Offline);

        let error = service.ready().await.unwrap().call(call_with(json!(1))).await.unwrap_err();
        assert_eq!(error, json!({ "status": "unavailable", "pattern": "users.find" }));

        let error = RpcExceptionsLayer::new(Arc::new(RpcExceptionsHandler::new()))
            .layer(Offline)
            .oneshot(call_with(json!(1)))
            .await
            .unwrap_err();
        assert_eq!(error, json!({ "status": "error", "message": "Internal server error" }));
    }
}
