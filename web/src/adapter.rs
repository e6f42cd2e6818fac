//! Adapters: cross-cutting wrappers around handlers.
//!
//! An adapter takes a [`Handler`] and returns a handler that wraps it, e.g. to
//! authenticate, log or decorate the response. Chains are applied with the
//! first adapter outermost:
//!
//! ```text
//! adapt_handler(h, [a, b, c])  ==  a(b(c(h)))
//!
//!   request ──► a ──► b ──► c ──► h
//!   response ◄── a ◄── b ◄── c ◄──┘
//! ```
//!
//! Applying a chain never modifies the handler it is given, so re-applying the
//! same chain to the same base handler always yields an equivalent handler.

use std::sync::Arc;

use crate::handler::Handler;

/// Wraps a handler into another handler.
pub trait Adapter: Send + Sync + 'static {
    /// Wrap `next`.
    fn adapt(&self, next: Handler) -> Handler;
}

impl<F> Adapter for F
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    fn adapt(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// A shareable adapter, as stored by the registry.
pub type SharedAdapter = Arc<dyn Adapter>;

/// Turn an adapter into a [`SharedAdapter`].
///
/// # Examples
///
/// ```
/// use endpoint_kit_web::{adapter, Handler};
/// use http::{HeaderName, HeaderValue};
///
/// let tag = adapter(|next: Handler| {
///     Handler::from_fn(move |ctx, sink, req| {
///         sink.insert_header(HeaderName::from_static("x-served-by"), HeaderValue::from_static("kit"));
///         next.call(ctx, sink, req)
///     })
/// });
/// ```
pub fn adapter<A: Adapter>(adapter: A) -> SharedAdapter {
    Arc::new(adapter)
}

/// Wrap `handler` in `adapters`, first adapter outermost.
#[must_use]
pub fn adapt_handler(handler: &Handler, adapters: &[SharedAdapter]) -> Handler {
    adapters
        .iter()
        .rev()
        .fold(handler.clone(), |next, adapter| adapter.adapt(next))
}
