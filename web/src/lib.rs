//! Axum integration for endpoint-kit.
//!
//! Business logic is written as plain async functions taking a request
//! [`Context`], a [`ResponseSink`] and a typed request value. This crate turns
//! them into uniform [`Handler`]s, keeps them in a [`Service`] registry, wraps
//! them in cross-cutting [`Adapter`]s and mounts them on an axum router.
//!
//! # Request Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ axum Router  (prefix, method check, cancel-on-drop)
//! ├──────────────────────────────────────────────────┤
//! │ registry adapters      e.g. trace_requests()     │
//! │ endpoint adapters      e.g. correlation_id()     │
//! ├──────────────────────────────────────────────────┤
//! │ dispatch   read body ─► decode ─► validate       │  ← 400 on failure
//! │            call function ─► translate            │  ← envelope
//! ├──────────────────────────────────────────────────┤
//! │ endpoint function (business logic)               │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use endpoint_kit_core::{Response, Validate};
//! use endpoint_kit_web::{middleware, Context, ResponseSink, Service};
//! use http::Method;
//!
//! #[derive(serde::Deserialize)]
//! struct Greet { name: String }
//!
//! impl Validate for Greet {}
//!
//! async fn greet(_ctx: Context, _sink: ResponseSink, req: Greet) -> Result<Option<Response>, anyhow::Error> {
//!     Ok(Some(Response::ok(&format!("hello, {}", req.name))?))
//! }
//!
//! let service = Service::new();
//! service.register_endpoint(Method::POST, "/greet", greet, &[])?;
//! service.adapt(&[middleware::trace_requests(), middleware::correlation_id()]);
//!
//! axum::serve(listener, service.router()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod handler;
pub mod middleware;
pub mod respond;
pub mod router;
pub mod service;
pub mod sink;

// Re-export key types for convenience
pub use adapter::{adapt_handler, adapter, Adapter, SharedAdapter};
pub use config::{ConfigError, DispatchConfig, DEFAULT_BODY_LIMIT};
pub use context::{CancelGuard, CancelHandle, Context};
pub use dispatch::DispatchOptions;
pub use endpoint::{Dynamic, DynamicEndpoint, IntoEndpoint, Typed};
pub use handler::{Handler, HandlerFuture};
pub use middleware::{correlation_id, trace_requests, CorrelationId, CorrelationIdExt, CORRELATION_ID_HEADER};
pub use router::{mount, serve};
pub use service::{Endpoint, Endpoints, Service};
pub use sink::{ResponseSink, SinkError};
