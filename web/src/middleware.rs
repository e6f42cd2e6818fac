//! Built-in adapters for request tracking and observability.
//!
//! - **[`correlation_id`]**: extract or generate a correlation ID, expose it on
//!   the [`Context`], echo it in the `x-correlation-id` response header and run
//!   the request inside a span carrying it
//! - **[`trace_requests`]**: one `http_request` span per request plus a
//!   completion event with status and latency
//!
//! # Example
//!
//! ```ignore
//! use endpoint_kit_web::middleware::{correlation_id, trace_requests};
//!
//! service.adapt(&[trace_requests(), correlation_id()]);
//! ```

use axum::extract::Request;
use http::{HeaderName, HeaderValue, StatusCode};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapter::{adapter, SharedAdapter};
use crate::context::Context;
use crate::handler::Handler;
use crate::sink::ResponseSink;

/// Header carrying the correlation ID, in requests and responses.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Correlation ID of the current request, as stored in the [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

/// Adapter that tracks a correlation ID per request.
///
/// A well-formed UUID in the request's `x-correlation-id` header is reused;
/// otherwise a new one is generated.
#[must_use]
pub fn correlation_id() -> SharedAdapter {
    adapter(|next: Handler| {
        Handler::from_fn(move |ctx: Context, sink: ResponseSink, req: Request| {
            let correlation_id = req
                .headers()
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4);

            if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                sink.insert_header(CORRELATION_ID_HEADER, value);
            }

            let span = tracing::info_span!("correlation", correlation_id = %correlation_id);
            next.call(ctx.with_value(CorrelationId(correlation_id)), sink, req)
                .instrument(span)
        })
    })
}

/// Adapter that traces every request.
#[must_use]
pub fn trace_requests() -> SharedAdapter {
    adapter(|next: Handler| {
        Handler::from_fn(move |ctx: Context, sink: ResponseSink, req: Request| {
            let next = next.clone();
            let span = tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
            );

            async move {
                let started = Instant::now();
                next.call(ctx, sink.clone(), req).await;

                let status = sink.status().unwrap_or(StatusCode::OK);
                tracing::info!(
                    status = status.as_u16(),
                    elapsed = ?started.elapsed(),
                    "Request completed"
                );
            }
            .instrument(span)
        })
    })
}

/// Extension trait for reading the correlation ID off a [`Context`].
///
/// # Example
///
/// ```ignore
/// use endpoint_kit_web::middleware::CorrelationIdExt;
///
/// async fn handler(ctx: Context, sink: ResponseSink, req: Ping) -> Result<(), anyhow::Error> {
///     tracing::info!(correlation_id = ?ctx.correlation_id(), "ping");
///     Ok(())
/// }
/// ```
pub trait CorrelationIdExt {
    /// The correlation ID, if the [`correlation_id`] adapter ran.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl CorrelationIdExt for Context {
    fn correlation_id(&self) -> Option<Uuid> {
        self.value::<CorrelationId>().map(|id| id.0)
    }
}
