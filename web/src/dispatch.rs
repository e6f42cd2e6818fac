//! The request pipeline behind every endpoint.
//!
//! ```text
//! request ─► read body ─► decode + validate ─┬─► 400 envelope   (function not called)
//!                                             │
//!                                             └─► call function ─► translate ─► envelope
//! ```
//!
//! The body is decoded into a fresh instance of the declared request type on
//! every request. Rejections never reach the endpoint function.

use axum::body::{Body, Bytes};
use axum::extract::Request;
use endpoint_kit_core::{
    decode, outcome_from_values, translate, AnyRequest, Contract, Error, HandlerReturn, Outcome,
    RequestError, Returned, Validate,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

use crate::context::Context;
use crate::handler::Handler;
use crate::respond;
use crate::sink::{ResponseSink, SinkError};

/// Per-endpoint settings fixed at registration.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    path: Arc<str>,
    body_limit: usize,
}

impl DispatchOptions {
    /// Options for the endpoint at `path`, reading at most `body_limit` bytes.
    pub fn new(path: impl Into<Arc<str>>, body_limit: usize) -> Self {
        Self {
            path: path.into(),
            body_limit,
        }
    }

    /// Path the endpoint is registered under.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Largest accepted request body, in bytes.
    #[must_use]
    pub const fn body_limit(&self) -> usize {
        self.body_limit
    }
}

/// Handler for a typed endpoint function.
pub(crate) fn typed<F, Fut, Req, Ret>(f: F, options: DispatchOptions) -> Handler
where
    F: Fn(Context, ResponseSink, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Ret> + Send + 'static,
    Req: DeserializeOwned + Validate + Send + 'static,
    Ret: HandlerReturn,
{
    let f = Arc::new(f);
    Handler::from_fn(move |ctx, sink, req| {
        let f = Arc::clone(&f);
        let options = options.clone();
        let span = dispatch_span(&options, &req);

        async move {
            run(ctx, sink, req, &options, decode::<Req>, move |ctx, sink, request| async move {
                (*f)(ctx, sink, request).await.into_outcome()
            })
            .await;
        }
        .instrument(span)
    })
}

/// Handler for a runtime-described endpoint function.
pub(crate) fn dynamic<F, Fut>(contract: Contract, f: F, options: DispatchOptions) -> Handler
where
    F: Fn(Context, ResponseSink, AnyRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<Returned>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler::from_fn(move |ctx, sink, req| {
        let f = Arc::clone(&f);
        let options = options.clone();
        let request_type = contract.request();
        let arity = contract.arity();
        let span = dispatch_span(&options, &req);

        async move {
            run(
                ctx,
                sink,
                req,
                &options,
                move |body: &[u8]| request_type.decode(body),
                move |ctx, sink, request| async move {
                    outcome_from_values(arity, (*f)(ctx, sink, request).await)
                },
            )
            .await;
        }
        .instrument(span)
    })
}

fn dispatch_span(options: &DispatchOptions, req: &Request) -> tracing::Span {
    tracing::debug_span!(
        "endpoint.dispatch",
        path = options.path(),
        method = %req.method(),
    )
}

async fn run<Req, D, C, CFut>(
    ctx: Context,
    sink: ResponseSink,
    req: Request,
    options: &DispatchOptions,
    decode: D,
    call: C,
) where
    D: FnOnce(&[u8]) -> Result<Req, RequestError>,
    C: FnOnce(Context, ResponseSink, Req) -> CFut,
    CFut: Future<Output = Outcome>,
{
    let (parts, body) = req.into_parts();

    let request = match read_body(body, options.body_limit()).await {
        Ok(bytes) => decode(&bytes),
        Err(err) => Err(err),
    };

    let request = match request {
        Ok(request) => request,
        Err(err) => {
            reject(&sink, options, err);
            return;
        }
    };

    let outcome = call(ctx.with_request(parts), sink.clone(), request).await;
    finish(&sink, options, outcome);
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, RequestError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|err| RequestError::Body(err.to_string()))
}

fn reject(sink: &ResponseSink, options: &DispatchOptions, err: RequestError) {
    tracing::warn!(path = options.path(), error = %err, "Rejecting request");
    record(options, err.kind());

    if let Err(err) = respond::with_error(sink, &Error::from(err)) {
        double_write(options, &err);
    }
}

fn finish(sink: &ResponseSink, options: &DispatchOptions, outcome: Outcome) {
    let reply = translate(outcome);
    record(options, if reply.is_ok() { "ok" } else { "handler_error" });

    if let Err(err) = respond::with_reply(sink, &reply) {
        double_write(options, &err);
    }
}

fn record(options: &DispatchOptions, outcome: &'static str) {
    metrics::counter!(
        "endpoint.requests",
        "path" => options.path().to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

fn double_write(options: &DispatchOptions, err: &SinkError) {
    tracing::warn!(
        path = options.path(),
        error = %err,
        "Endpoint wrote its own response; dropping the translated reply"
    );
    metrics::counter!("endpoint.sink.double_write", "path" => options.path().to_string())
        .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use endpoint_kit_core::{validate_signature, Arity, RequestType, Response, Signature};
    use http::StatusCode;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize)]
    struct Echo {
        text: String,
    }

    impl Validate for Echo {
        fn validate(&self) -> Result<(), anyhow::Error> {
            anyhow::ensure!(!self.text.is_empty(), "text is required");
            Ok(())
        }
    }

    fn post(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from(body))
            .unwrap()
    }

    async fn dispatch(handler: &Handler, req: Request) -> (StatusCode, Value) {
        let sink = ResponseSink::new();
        handler.call(Context::background(), sink.clone(), req).await;
        let body = sink.body().unwrap();
        (sink.status().unwrap(), serde_json::from_slice(&body).unwrap())
    }

    fn counting_echo(calls: &Arc<AtomicUsize>) -> Handler {
        let calls = calls.clone();
        typed(
            move |_ctx: Context, _sink: ResponseSink, req: Echo| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(Some(Response::ok(&json!({ "echo": req.text }))?)) }
            },
            DispatchOptions::new("/echo", 1024),
        )
    }

    #[tokio::test]
    async fn test_typed_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting_echo(&calls);

        let (status, body) = dispatch(&handler, post(r#"{"text":"hi"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200, "data": {"echo": "hi"}}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_skips_function() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting_echo(&calls);

        let (status, body) = dispatch(&handler, post("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().starts_with("could not decode request: "));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_validation_skips_function() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting_echo(&calls);

        let (status, body) = dispatch(&handler, post(r#"{"text":""}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "could not validate request: text is required");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = typed(
            {
                let calls = calls.clone();
                move |_ctx: Context, _sink: ResponseSink, _req: Value| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<(), anyhow::Error>(()) }
                }
            },
            DispatchOptions::new("/small", 4),
        );

        let (status, body) = dispatch(&handler, post(r#"{"a":"too long"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("could not read request body"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_function_sees_request_head() {
        let handler = typed(
            |ctx: Context, _sink: ResponseSink, _req: Value| async move {
                let uri = ctx.request().map(|parts| parts.uri.to_string());
                Ok::<_, anyhow::Error>(Some(Response::ok(&json!({ "uri": uri }))?))
            },
            DispatchOptions::new("/echo", 1024),
        );

        let (_, body) = dispatch(&handler, post("{}")).await;

        assert_eq!(body["data"]["uri"], "/echo");
    }

    #[tokio::test]
    async fn test_own_write_wins() {
        let handler = typed(
            |_ctx: Context, sink: ResponseSink, _req: Value| async move {
                sink.write(StatusCode::ACCEPTED, r#"{"raw":true}"#).unwrap();
                Err::<(), anyhow::Error>(anyhow::anyhow!("ignored"))
            },
            DispatchOptions::new("/raw", 1024),
        );

        let (status, body) = dispatch(&handler, post("{}")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, json!({"raw": true}));
    }

    #[tokio::test]
    async fn test_dynamic_arity_mismatch_is_internal_error() {
        let signature = Signature::canonical(RequestType::of::<Value>(), Arity::ResponseAndError);
        let contract = validate_signature(&signature).unwrap();
        let handler = dynamic(
            contract,
            |_ctx, _sink, _req| async { vec![Returned::Error(None)] },
            DispatchOptions::new("/dyn", 1024),
        );

        let (status, body) = dispatch(&handler, post("{}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
    }
}
