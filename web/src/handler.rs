//! The uniform request handler.

use axum::extract::Request;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::sink::ResponseSink;

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, ()>;

type HandlerFn = dyn Fn(Context, ResponseSink, Request) -> HandlerFuture + Send + Sync;

/// A uniform, invokable request handler.
///
/// Every endpoint ends up as a `Handler`: raw handlers are registered as-is,
/// typed endpoint functions are adapted into one at registration. A handler
/// receives the request context, the sink it must write its single response to,
/// and the raw HTTP request.
///
/// Cloning is cheap and yields a handler with identical behavior.
///
/// # Examples
///
/// ```
/// use endpoint_kit_web::{respond, Handler};
/// use endpoint_kit_core::Response;
///
/// let health = Handler::from_fn(|_ctx, sink, _req| async move {
///     let _ = respond::with_json(&sink, &Response::default());
/// });
/// ```
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Build a handler from an async function.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, ResponseSink, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |ctx, sink, req| f(ctx, sink, req).boxed()),
        }
    }

    /// Handle one request.
    pub fn call(&self, ctx: Context, sink: ResponseSink, req: Request) -> HandlerFuture {
        (self.inner)(ctx, sink, req)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}
