//! Mounting endpoints on an axum [`Router`].
//!
//! Each endpoint becomes one route. Requests with a method the endpoint was
//! not registered for are answered `405` in the failure envelope; `HEAD` is
//! accepted wherever `GET` is. Every
//! request gets a fresh [`Context`] that is cancelled when axum drops the
//! request future, e.g. because the client disconnected.

use axum::extract::Request;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use endpoint_kit_core::Error;
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use std::sync::Arc;

use crate::context::Context;
use crate::handler::Handler;
use crate::respond;
use crate::service::{Endpoint, Endpoints, Service};
use crate::sink::ResponseSink;

impl Service {
    /// An axum router serving this service's endpoints under its prefix.
    #[must_use]
    pub fn router(&self) -> Router {
        mount(self.prefix(), self.endpoints())
    }
}

/// Build a router serving `endpoints` under `prefix`.
///
/// Paths that are not absolute, or that contain route parameter syntax
/// (`:` or `*`), are skipped with a warning.
#[must_use]
pub fn mount(prefix: &str, endpoints: Endpoints) -> Router {
    let mut router = Router::new();

    for (path, endpoint) in endpoints {
        if !path.starts_with('/') {
            tracing::warn!(%path, "Skipping endpoint with relative path");
            continue;
        }
        if path.contains([':', '*']) {
            tracing::warn!(%path, "Skipping endpoint with pattern path");
            continue;
        }

        tracing::debug!(%path, methods = ?endpoint.methods, "Mounting endpoint");
        let endpoint = Arc::new(endpoint);
        router = router.route(
            &path,
            any(move |request: Request| serve_endpoint(Arc::clone(&endpoint), request)),
        );
    }

    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        router
    } else if !prefix.starts_with('/') {
        tracing::warn!(%prefix, "Ignoring relative prefix, mounting at root");
        router
    } else {
        Router::new().nest(prefix, router)
    }
}

fn allows(methods: &[Method], method: &Method) -> bool {
    methods.contains(method) || (*method == Method::HEAD && methods.contains(&Method::GET))
}

async fn serve_endpoint(endpoint: Arc<Endpoint>, request: Request) -> Response {
    if !allows(&endpoint.methods, request.method()) {
        return method_not_allowed(&endpoint.methods, request.method());
    }

    serve(endpoint.handler.clone(), request).await
}

/// Run `handler` for one HTTP request and collect its response.
///
/// The handler's context is cancelled once this future completes or is dropped.
pub async fn serve(handler: Handler, request: Request) -> Response {
    let (ctx, cancel) = Context::with_cancel();
    let _guard = cancel.drop_guard();

    let sink = ResponseSink::new();
    handler.call(ctx, sink.clone(), request).await;
    sink.into_response()
}

fn method_not_allowed(allowed: &[Method], method: &Method) -> Response {
    let sink = ResponseSink::new();
    let error = Error::msg(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed"),
    );

    // A fresh sink always accepts the first write.
    let _ = respond::with_error(&sink, &error);

    let mut allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>();
    if allows(allowed, &Method::HEAD) && !allowed.contains(&Method::HEAD) {
        allow.push(Method::HEAD.as_str());
    }
    let allow = allow.join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        sink.insert_header(ALLOW, value);
    }

    sink.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn ok_handler() -> Handler {
        Handler::from_fn(|_ctx, sink: ResponseSink, req: Request| async move {
            sink.write(StatusCode::OK, req.uri().path().to_string()).unwrap();
        })
    }

    fn endpoints(path: &str, methods: Vec<Method>) -> Endpoints {
        let mut endpoints = Endpoints::new();
        endpoints.insert(
            path.to_string(),
            Endpoint {
                methods,
                handler: ok_handler(),
            },
        );
        endpoints
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_routes_registered_method() {
        let app = mount("/", endpoints("/hello", vec![Method::GET]));

        let response = app
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "/hello");
    }

    #[tokio::test]
    async fn test_other_method_is_405() {
        let app = mount("/", endpoints("/hello", vec![Method::GET]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/hello")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD");
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"code": 405, "error": "method DELETE not allowed"}));
    }

    #[tokio::test]
    async fn test_head_allowed_with_get() {
        let app = mount("/", endpoints("/hello", vec![Method::GET]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/hello")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_head_rejected_without_get() {
        let app = mount("/", endpoints("/submit", vec![Method::POST]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/submit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_prefix_nests_routes() {
        let app = mount("/api/", endpoints("/hello", vec![Method::GET]));

        let nested = app
            .clone()
            .oneshot(Request::builder().uri("/api/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(nested.status(), StatusCode::OK);

        let bare = app
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(bare.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relative_path_is_skipped() {
        let app = mount("/", endpoints("hello", vec![Method::GET]));

        let response = app
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pattern_paths_are_skipped() {
        let mut all = endpoints("/files/*", vec![Method::GET]);
        all.extend(endpoints("/users/:id", vec![Method::GET]));
        all.extend(endpoints("/files/list", vec![Method::GET]));

        let app = mount("/", all);

        let listed = app
            .clone()
            .oneshot(Request::builder().uri("/files/list").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(listed.status(), StatusCode::OK);

        let pattern = app
            .oneshot(Request::builder().uri("/users/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(pattern.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_cancels_context_afterwards() {
        let seen = Arc::new(std::sync::Mutex::new(None::<Context>));
        let handler = {
            let seen = seen.clone();
            Handler::from_fn(move |ctx: Context, _sink, _req| {
                *seen.lock().unwrap() = Some(ctx);
                async {}
            })
        };

        let response = serve(handler, Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let ctx = seen.lock().unwrap().take().unwrap();
        assert!(ctx.is_cancelled());
    }
}
