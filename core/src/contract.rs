//! Endpoint calling contract.
//!
//! Every endpoint function follows one fixed shape:
//!
//! ```text
//! (Context, ResponseSink, *Request) -> error
//! (Context, ResponseSink, *Request) -> (*Response, error)
//! ```
//!
//! Typed endpoints satisfy this at compile time. Endpoints assembled at runtime
//! describe themselves with a [`Signature`] instead, and [`validate_signature`]
//! checks it once, at registration, before anything is stored. The result is a
//! [`Contract`] that caches the request type for the decoder and the return arity
//! for the translator, so none of this is re-derived per request.

use std::fmt;

use crate::decode::RequestType;

/// A parameter in an endpoint signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// The request context (deadline and cancellation).
    Context,
    /// The response sink of the transport.
    Sink,
    /// A pointer to a decodable request type.
    Pointer(RequestType),
    /// Any other value, by name.
    Value(&'static str),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => f.write_str("Context"),
            Self::Sink => f.write_str("ResponseSink"),
            Self::Pointer(request) => write!(f, "*{}", request.name()),
            Self::Value(name) => f.write_str(name),
        }
    }
}

/// A return value in an endpoint signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    /// An error value.
    Error,
    /// A pointer to a [`Response`](crate::Response).
    Response,
    /// Any other value, by name.
    Value(&'static str),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Response => f.write_str("*Response"),
            Self::Value(name) => f.write_str(name),
        }
    }
}

/// Runtime description of a function's shape.
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::{validate_signature, Arity, ParamType, RequestType, ReturnType, Signature};
///
/// let signature = Signature::new()
///     .param(ParamType::Context)
///     .param(ParamType::Sink)
///     .param(ParamType::Pointer(RequestType::of::<serde_json::Value>()))
///     .returns(ReturnType::Response)
///     .returns(ReturnType::Error);
///
/// let contract = validate_signature(&signature).unwrap();
/// assert_eq!(contract.arity(), Arity::ResponseAndError);
/// assert!(contract.request().is::<serde_json::Value>());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamType>,
    returns: Vec<ReturnType>,
}

impl Signature {
    /// An empty signature.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            params: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// The canonical signature of an endpoint decoding into `request`.
    #[must_use]
    pub fn canonical(request: RequestType, arity: Arity) -> Self {
        let signature = Self::new()
            .param(ParamType::Context)
            .param(ParamType::Sink)
            .param(ParamType::Pointer(request));

        match arity {
            Arity::ErrorOnly => signature.returns(ReturnType::Error),
            Arity::ResponseAndError => signature
                .returns(ReturnType::Response)
                .returns(ReturnType::Error),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamType) -> Self {
        self.params.push(param);
        self
    }

    /// Append a return value.
    #[must_use]
    pub fn returns(mut self, ret: ReturnType) -> Self {
        self.returns.push(ret);
        self
    }

    /// Parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Return values, in order.
    #[must_use]
    pub fn return_types(&self) -> &[ReturnType] {
        &self.returns
    }
}

/// How many values an endpoint function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// `error`
    ErrorOnly,
    /// `(*Response, error)`
    ResponseAndError,
}

impl Arity {
    /// Number of returned values.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::ErrorOnly => 1,
            Self::ResponseAndError => 2,
        }
    }
}

/// A validated endpoint shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contract {
    request: RequestType,
    arity: Arity,
}

impl Contract {
    /// Request type the decoder targets.
    #[must_use]
    pub const fn request(&self) -> RequestType {
        self.request
    }

    /// Return arity the translator expects.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }
}

/// A function shape that violates the endpoint contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Wrong number of parameters.
    #[error("incorrect endpoint signature: expected 3 parameters, found {0}")]
    ParamCount(usize),

    /// Wrong number of return values.
    #[error("endpoint must return one or two values, found {0}")]
    ReturnCount(usize),

    /// The only return value is not an error.
    #[error("single endpoint return value must be an error, found {0}")]
    SingleReturnNotError(String),

    /// First of two return values is not a response.
    #[error("first return value must be *Response, found {0}")]
    FirstReturnNotResponse(String),

    /// Second of two return values is not an error.
    #[error("second return value must be an error, found {0}")]
    SecondReturnNotError(String),

    /// First parameter is not the context.
    #[error("parameter one must be the request Context, found {0}")]
    ContextParam(String),

    /// Second parameter is not the response sink.
    #[error("parameter two must be the ResponseSink, found {0}")]
    SinkParam(String),

    /// Third parameter is not a pointer to a request type.
    #[error("parameter three must be a pointer to the request type, found {0}")]
    RequestParam(String),
}

/// Check `signature` against the endpoint contract.
///
/// Rules are checked in order and the first violation is reported:
///
/// 1. exactly three parameters
/// 2. one or two return values: `error`, or `*Response` followed by `error`
/// 3. parameter one is the context
/// 4. parameter two is the response sink
/// 5. parameter three is a pointer to some request type
///
/// # Errors
///
/// Returns the [`ContractError`] for the first rule `signature` breaks.
pub fn validate_signature(signature: &Signature) -> Result<Contract, ContractError> {
    let params = signature.params();
    let returns = signature.return_types();

    let [context, sink, request] = params else {
        return Err(ContractError::ParamCount(params.len()));
    };

    let arity = match returns {
        [ReturnType::Error] => Arity::ErrorOnly,
        [other] => return Err(ContractError::SingleReturnNotError(other.to_string())),
        [ReturnType::Response, ReturnType::Error] => Arity::ResponseAndError,
        [ReturnType::Response, other] => {
            return Err(ContractError::SecondReturnNotError(other.to_string()));
        }
        [other, _] => return Err(ContractError::FirstReturnNotResponse(other.to_string())),
        _ => return Err(ContractError::ReturnCount(returns.len())),
    };

    if *context != ParamType::Context {
        return Err(ContractError::ContextParam(context.to_string()));
    }

    if *sink != ParamType::Sink {
        return Err(ContractError::SinkParam(sink.to_string()));
    }

    let ParamType::Pointer(request) = request else {
        return Err(ContractError::RequestParam(request.to_string()));
    };

    Ok(Contract {
        request: *request,
        arity,
    })
}
