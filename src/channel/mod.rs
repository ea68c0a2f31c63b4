use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::future::{Future, IntoFuture};

/// A lazily evaluated channel that emits exactly one error and completes
///
/// Nothing runs until the channel is awaited or its stream is polled, so the
/// transport can compose it with success channels the same way.
///
/// # Example
/// ```
/// use rpc_exceptions::channel::ErrorChannel;
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let error = ErrorChannel::throw(json!({ "status": "error" })).await;
/// assert_eq!(error["status"], "error");
/// # });
/// ```
pub struct ErrorChannel {
    source: BoxFuture<'static, Value>,
}

impl ErrorChannel {
    /// A channel that emits `error` as soon as it is subscribed
    pub fn throw(error: Value) -> Self {
        Self {
            source: future::ready(error).boxed(),
        }
    }

    /// A channel whose error is produced by `future`
    ///
    /// The future is not polled before subscription and is never timed out.
    pub fn defer<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        Self {
            source: future.boxed(),
        }
    }

    /// Stream form: one `Err` item, then the end of the stream
    pub fn into_stream(self) -> BoxStream<'static, Result<Infallible, Value>> {
        stream::once(self.source.map(Err)).boxed()
    }
}

impl IntoFuture for ErrorChannel {
    type Output = Value;
    type IntoFuture = BoxFuture<'static, Value>;

    fn into_future(self) -> Self::IntoFuture {
        self.source
    }
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_stream_emits_single_error() {
        let mut events = ErrorChannel::throw(json!("boom")).into_stream();

        match events.next().await {
            Some(Err(error)) => assert_eq!(error, json!("boom")),
            other => panic!("expected a single error, got {:?}", other),
        }
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_defer_is_lazy() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);

        let channel = ErrorChannel::defer(async move {
            flag.store(true, Ordering::SeqCst);
            json!({ "status": "late" })
        });
        tokio::task::yield_now().await;
        assert!(!started.load(Ordering::SeqCst));

        assert_eq!(channel.await, json!({ "status": "late" }));
        assert!(started.load(Ordering::SeqCst));
    }
}
