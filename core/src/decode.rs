//! Request decoding.
//!
//! Request bodies are JSON documents parsed into the request type an endpoint
//! declared. After a successful parse the value's [`Validate`] hook runs. The two
//! failure modes stay distinct ([`RequestError::Decode`] and
//! [`RequestError::Validation`]) but both are client faults answered with
//! `400 Bad Request`.
//!
//! Typed endpoints call [`decode()`] directly. Dynamically described endpoints
//! only know their request type at runtime, so the validator records a
//! [`RequestType`]: the type's identity plus a decode function monomorphized for
//! it. Decoding through a `RequestType` always produces exactly that type.

use http::StatusCode;
use serde::de::DeserializeOwned;
use std::any::{type_name, Any, TypeId};
use std::fmt;

use crate::validate::Validate;

/// A decoded request whose concrete type is only known at runtime.
pub type AnyRequest = Box<dyn Any + Send>;

/// Why a request was rejected before reaching the endpoint function.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The body could not be read from the transport.
    #[error("could not read request body: {0}")]
    Body(String),

    /// The body is not a well-formed document for the declared request type.
    #[error("could not decode request: {0}")]
    Decode(#[from] serde_json::Error),

    /// The body decoded but the request's validation hook rejected it.
    #[error("could not validate request: {0}")]
    Validation(anyhow::Error),
}

impl RequestError {
    /// Status code answered to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Short label used for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Body(_) | Self::Decode(_) => "decode_error",
            Self::Validation(_) => "validation_error",
        }
    }
}

/// Decode `body` into `T` and run its validation hook.
///
/// # Errors
///
/// - [`RequestError::Decode`] if `body` is not valid JSON for `T`
/// - [`RequestError::Validation`] if [`Validate::validate`] rejects the value
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::{decode, RequestError, Validate};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Greet {
///     name: String,
/// }
///
/// impl Validate for Greet {}
///
/// let greet: Greet = decode(br#"{"name":"ada"}"#).unwrap();
/// assert_eq!(greet.name, "ada");
///
/// let err = decode::<Greet>(b"{").unwrap_err();
/// assert!(matches!(err, RequestError::Decode(_)));
/// ```
pub fn decode<T>(body: &[u8]) -> Result<T, RequestError>
where
    T: DeserializeOwned + Validate,
{
    let request: T = serde_json::from_slice(body)?;
    request.validate().map_err(RequestError::Validation)?;
    Ok(request)
}

fn decode_erased<T>(body: &[u8]) -> Result<AnyRequest, RequestError>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    decode::<T>(body).map(|request| Box::new(request) as AnyRequest)
}

/// Runtime description of a request type.
#[derive(Clone, Copy)]
pub struct RequestType {
    id: TypeId,
    name: &'static str,
    decode: fn(&[u8]) -> Result<AnyRequest, RequestError>,
}

impl RequestType {
    /// Describe `T`.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Validate + Send + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            decode: decode_erased::<T>,
        }
    }

    /// Type identity.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this describes `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Decode `body` into a boxed value of the described type.
    ///
    /// The returned box always downcasts to the described type.
    ///
    /// # Errors
    ///
    /// Same as [`decode()`].
    pub fn decode(&self, body: &[u8]) -> Result<AnyRequest, RequestError> {
        (self.decode)(body)
    }
}

impl PartialEq for RequestType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RequestType {}

impl fmt::Debug for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestType").field(&self.name).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Transfer {
        from: String,
        to: String,
        amount: u64,
    }

    impl Validate for Transfer {
        fn validate(&self) -> Result<(), anyhow::Error> {
            anyhow::ensure!(self.amount > 0, "amount must be positive");
            anyhow::ensure!(self.from != self.to, "cannot transfer to the same account");
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Other {
        #[allow(dead_code)]
        amount: u64,
    }

    impl Validate for Other {}

    #[test]
    fn test_decode_valid() {
        let transfer: Transfer = decode(br#"{"from":"a","to":"b","amount":5}"#).unwrap();
        assert_eq!(
            transfer,
            Transfer {
                from: "a".into(),
                to: "b".into(),
                amount: 5
            }
        );
    }

    #[test]
    fn test_malformed_is_decode_error() {
        let err = decode::<Transfer>(br#"{"from":"a","#).unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
        assert_eq!(err.kind(), "decode_error");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_body_is_decode_error() {
        assert!(matches!(decode::<Transfer>(b"").unwrap_err(), RequestError::Decode(_)));
    }

    #[test]
    fn test_wrong_shape_is_decode_error() {
        let err = decode::<Transfer>(br#"{"from":"a","to":"b","amount":"lots"}"#).unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[test]
    fn test_failed_check_is_validation_error() {
        let err = decode::<Transfer>(br#"{"from":"a","to":"a","amount":5}"#).unwrap_err();

        assert!(matches!(err, RequestError::Validation(_)));
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(
            err.to_string(),
            "could not validate request: cannot transfer to the same account"
        );
    }

    #[test]
    fn test_request_type_decodes_its_own_type() {
        let request_type = RequestType::of::<Transfer>();
        let decoded = request_type
            .decode(br#"{"from":"a","to":"b","amount":1}"#)
            .unwrap();

        assert!(request_type.is::<Transfer>());
        assert!(!request_type.is::<Other>());
        assert!(decoded.downcast_ref::<Transfer>().is_some());
        assert!(decoded.downcast_ref::<Other>().is_none());
    }

    #[test]
    fn test_request_type_runs_validation() {
        let err = RequestType::of::<Transfer>()
            .decode(br#"{"from":"a","to":"b","amount":0}"#)
            .unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
    }

    #[test]
    fn test_request_type_equality_is_by_type() {
        assert_eq!(RequestType::of::<Transfer>(), RequestType::of::<Transfer>());
        assert_ne!(RequestType::of::<Transfer>(), RequestType::of::<Other>());
        assert!(RequestType::of::<Transfer>().name().ends_with("Transfer"));
    }
}
