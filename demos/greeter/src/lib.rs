//! Greeter demo service.
//!
//! Three endpoints showing the ways business logic plugs into a [`Service`]:
//!
//! - `POST /greet`: typed endpoint returning a response
//! - `POST /ping`: typed endpoint returning only an error
//! - `GET /health`: raw handler writing its own envelope

use endpoint_kit_core::{Error, Response, Validate};
use endpoint_kit_web::{
    correlation_id, respond, trace_requests, Context, CorrelationIdExt, DispatchConfig, Handler,
    ResponseSink, Service,
};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Names the greeter refuses to greet.
const BLOCKED: &[&str] = &["mallory"];

/// Request body of `POST /greet`.
#[derive(Debug, Deserialize)]
pub struct GreetRequest {
    /// Who to greet
    pub name: String,
    /// Optional greeting, defaults to "Hello"
    #[serde(default)]
    pub greeting: Option<String>,
}

impl Validate for GreetRequest {
    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(!self.name.trim().is_empty(), "name must not be empty");
        anyhow::ensure!(self.name.len() <= 64, "name must be at most 64 characters");
        Ok(())
    }
}

/// Response payload of `POST /greet`.
#[derive(Debug, Serialize)]
pub struct Greeting {
    /// The greeting text
    pub message: String,
    /// Correlation ID of the request, when tracked
    pub correlation_id: Option<String>,
}

/// Request body of `POST /ping`.
#[derive(Debug, Deserialize)]
pub struct PingRequest {}

impl Validate for PingRequest {}

/// Greet someone.
///
/// # Errors
///
/// Returns a `403` for blocked names.
pub async fn greet(
    ctx: Context,
    _sink: ResponseSink,
    req: GreetRequest,
) -> Result<Option<Response>, anyhow::Error> {
    let name = req.name.trim();
    if BLOCKED.iter().any(|blocked| blocked.eq_ignore_ascii_case(name)) {
        return Err(Error::forbidden(format!("{name} may not be greeted")).into());
    }

    let greeting = Greeting {
        message: format!("{}, {name}!", req.greeting.as_deref().unwrap_or("Hello")),
        correlation_id: ctx.correlation_id().map(|id| id.to_string()),
    };
    Ok(Some(Response::ok(&greeting)?))
}

/// Answer with an empty `200`.
///
/// # Errors
///
/// Never fails.
pub async fn ping(_ctx: Context, _sink: ResponseSink, _req: PingRequest) -> Result<(), Error> {
    tracing::debug!("ping");
    Ok(())
}

/// Raw health handler.
#[must_use]
pub fn health() -> Handler {
    Handler::from_fn(|_ctx, sink: ResponseSink, _req| async move {
        let status = Response::from_value(StatusCode::OK, serde_json::json!({ "status": "up" }));
        if let Err(err) = respond::with_json(&sink, &status) {
            tracing::warn!(error = %err, "health response already written");
        }
    })
}

/// Build the greeter service.
///
/// # Errors
///
/// Fails if `config` is invalid or an endpoint violates the endpoint contract.
pub fn build_service(config: DispatchConfig) -> anyhow::Result<Service> {
    let service = Service::with_config(config)?;

    service.register_endpoint(Method::POST, "/greet", greet, &[correlation_id()])?;
    service.register_endpoint(Method::POST, "/ping", ping, &[])?;
    service.register_handler(Method::GET, "/health", health(), &[]);
    service.adapt(&[trace_requests()]);

    Ok(service)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let app = build_service(DispatchConfig::default()).unwrap().router();
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_greet() {
        let (status, body) = call(Method::POST, "/greet", r#"{"name":"Ada","greeting":"Hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Hi, Ada!");
        assert!(body["data"]["correlation_id"].is_string());
    }

    #[tokio::test]
    async fn test_greet_blocked_name() {
        let (status, body) = call(Method::POST, "/greet", r#"{"name":"Mallory"}"#).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"code": 403, "error": "Mallory may not be greeted"}));
    }

    #[tokio::test]
    async fn test_greet_empty_name() {
        let (status, body) = call(Method::POST, "/greet", r#"{"name":"  "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "could not validate request: name must not be empty");
    }

    #[tokio::test]
    async fn test_ping_and_health() {
        assert_eq!(call(Method::POST, "/ping", "{}").await, (StatusCode::OK, json!({"code": 200})));
        assert_eq!(
            call(Method::GET, "/health", "").await,
            (StatusCode::OK, json!({"code": 200, "data": {"status": "up"}}))
        );
    }
}
