//! Request context.
//!
//! A [`Context`] travels with every dispatched request. It carries:
//!
//! - **Cancellation**: fired by whoever owns the [`CancelHandle`], e.g. the router
//!   when the client goes away
//! - **Deadline**: an optional point in time supplied by the caller
//! - **Values**: typed request-scoped data added by adapters
//! - **The incoming request head**: method, URI, headers and extensions of the
//!   original HTTP request, reachable through [`Context::request`] even though
//!   endpoint functions only declare their decoded body
//!
//! The dispatch layer never imposes a timeout of its own. It threads the context
//! it is given through to the endpoint function unchanged, apart from attaching
//! the request head.

use http::request::Parts;
use http::Extensions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Request-scoped context handed to handlers and endpoint functions.
#[derive(Clone, Debug)]
pub struct Context {
    cancel: watch::Receiver<bool>,
    deadline: Option<Instant>,
    values: Extensions,
}

/// Typed slot for the incoming request head.
#[derive(Clone, Debug)]
struct IncomingRequest(Arc<Parts>);

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        let (_, cancel) = watch::channel(false);
        Self {
            cancel,
            deadline: None,
            values: Extensions::new(),
        }
    }

    /// A context together with the handle that cancels it.
    #[must_use]
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, cancel) = watch::channel(false);
        let context = Self {
            cancel,
            deadline: None,
            values: Extensions::new(),
        };
        (context, CancelHandle { tx: Arc::new(tx) })
    }

    /// Set a deadline. An earlier deadline already present is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context was cancelled or its deadline has passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a [`Context::background`] context.
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        let signal = async move {
            let sender_gone = cancel.wait_for(|cancelled| *cancelled).await.is_err();
            if sender_gone {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = signal => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }

    /// Attach a request-scoped value, replacing any previous value of type `T`.
    #[must_use]
    pub fn with_value<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.values.insert(value);
        self
    }

    /// A request-scoped value of type `T`.
    #[must_use]
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.values.get::<T>()
    }

    /// Attach the head of the incoming HTTP request.
    #[must_use]
    pub fn with_request(self, parts: Parts) -> Self {
        self.with_value(IncomingRequest(Arc::new(parts)))
    }

    /// The head of the incoming HTTP request.
    ///
    /// Present for every context built by the dispatcher of a typed endpoint.
    #[must_use]
    pub fn request(&self) -> Option<&Parts> {
        self.value::<IncomingRequest>().map(|incoming| incoming.0.as_ref())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

/// Cancels the contexts created alongside it.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel every clone of the associated context.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`CancelHandle::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Cancel when the returned guard is dropped.
    #[must_use]
    pub fn drop_guard(self) -> CancelGuard {
        CancelGuard { handle: self }
    }
}

/// Cancels its context on drop.
#[derive(Debug)]
pub struct CancelGuard {
    handle: CancelHandle,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
