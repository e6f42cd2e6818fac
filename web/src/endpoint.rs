//! Endpoint functions and how they become handlers.
//!
//! Anything registered through [`Service::register_endpoint`](crate::Service::register_endpoint)
//! implements [`IntoEndpoint`]. Two kinds of values do:
//!
//! - **Typed functions**: any `Fn(Context, ResponseSink, Req) -> impl Future<Output = R>`
//!   where `Req` is a JSON-decodable request type implementing
//!   [`Validate`] and `R` is `Result<(), E>` or `Result<Option<Response>, E>`.
//!   The compiler enforces the contract; the runtime check at registration always
//!   passes for them.
//! - **[`DynamicEndpoint`]s**: functions assembled at runtime that describe their
//!   shape with a [`Signature`]. The signature is validated at registration and a
//!   bad one is rejected with a [`ContractError`].
//!
//! ```ignore
//! use endpoint_kit_core::{Error, Response, Validate};
//! use endpoint_kit_web::{Context, ResponseSink, Service};
//!
//! #[derive(serde::Deserialize)]
//! struct GetUser { id: u64 }
//!
//! impl Validate for GetUser {}
//!
//! async fn get_user(
//!     ctx: Context,
//!     _sink: ResponseSink,
//!     req: GetUser,
//! ) -> Result<Option<Response>, anyhow::Error> {
//!     let user = users::find(req.id).await?.ok_or_else(|| Error::not_found("User", req.id))?;
//!     Ok(Some(Response::ok(&user)?))
//! }
//!
//! service.register_endpoint(Method::POST, "/users/get", get_user, &[])?;
//! ```

use endpoint_kit_core::{
    validate_signature, AnyRequest, ContractError, HandlerReturn, RequestType, Returned,
    Signature, Validate,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::dispatch::{self, DispatchOptions};
use crate::handler::Handler;
use crate::sink::ResponseSink;

/// Something that can be registered as an endpoint.
///
/// `M` only disambiguates the implementations and is inferred.
pub trait IntoEndpoint<M> {
    /// Validate the contract and build the handler.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] if the endpoint's shape violates the contract.
    fn into_handler(self, options: DispatchOptions) -> Result<Handler, ContractError>;
}

/// Marker for typed endpoint functions.
pub struct Typed<Req, Ret>(PhantomData<fn(Req) -> Ret>);

/// Marker for [`DynamicEndpoint`].
pub struct Dynamic;

impl<F, Fut, Req, Ret> IntoEndpoint<Typed<Req, Ret>> for F
where
    F: Fn(Context, ResponseSink, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Ret> + Send + 'static,
    Req: DeserializeOwned + Validate + Send + 'static,
    Ret: HandlerReturn,
{
    fn into_handler(self, options: DispatchOptions) -> Result<Handler, ContractError> {
        let contract = validate_signature(&Signature::canonical(RequestType::of::<Req>(), Ret::ARITY))?;

        tracing::debug!(
            path = options.path(),
            request = contract.request().name(),
            arity = ?contract.arity(),
            "typed endpoint contract validated"
        );

        Ok(dispatch::typed(self, options))
    }
}

type DynamicFn = dyn Fn(Context, ResponseSink, AnyRequest) -> BoxFuture<'static, Vec<Returned>> + Send + Sync;

/// An endpoint function described at runtime.
///
/// The function receives the decoded request as an [`AnyRequest`]; it always
/// downcasts to the type named by the signature's third parameter. It hands
/// back its results positionally, matching the signature's return types.
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::{ParamType, RequestType, Response, Returned, ReturnType, Signature};
/// use endpoint_kit_web::DynamicEndpoint;
///
/// let signature = Signature::new()
///     .param(ParamType::Context)
///     .param(ParamType::Sink)
///     .param(ParamType::Pointer(RequestType::of::<serde_json::Value>()))
///     .returns(ReturnType::Response)
///     .returns(ReturnType::Error);
///
/// let echo = DynamicEndpoint::new(signature, |_ctx, _sink, request| async move {
///     match request.downcast::<serde_json::Value>() {
///         Ok(value) => vec![
///             Returned::Response(Some(Response::from_value(http::StatusCode::OK, *value))),
///             Returned::Error(None),
///         ],
///         Err(_) => vec![Returned::Response(None), Returned::Error(Some(anyhow::anyhow!("unexpected request")))],
///     }
/// });
/// ```
#[derive(Clone)]
pub struct DynamicEndpoint {
    signature: Signature,
    call: Arc<DynamicFn>,
}

impl DynamicEndpoint {
    /// Describe `f` with `signature`.
    pub fn new<F, Fut>(signature: Signature, f: F) -> Self
    where
        F: Fn(Context, ResponseSink, AnyRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Returned>> + Send + 'static,
    {
        Self {
            signature,
            call: Arc::new(move |ctx, sink, request| f(ctx, sink, request).boxed()),
        }
    }

    /// The declared signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for DynamicEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicEndpoint")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl IntoEndpoint<Dynamic> for DynamicEndpoint {
    fn into_handler(self, options: DispatchOptions) -> Result<Handler, ContractError> {
        let contract = validate_signature(&self.signature)?;

        tracing::debug!(
            path = options.path(),
            request = contract.request().name(),
            arity = ?contract.arity(),
            "dynamic endpoint contract validated"
        );

        let call = self.call;
        Ok(dispatch::dynamic(
            contract,
            move |ctx, sink, request| call(ctx, sink, request),
            options,
        ))
    }
}
