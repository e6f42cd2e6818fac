//! Structured endpoint errors.
//!
//! An [`Error`] pairs an HTTP status code with the underlying cause. Business
//! functions return one when they want to choose the status themselves; any other
//! error they return is wrapped into a `500 Internal Server Error` by the
//! translator (see [`crate::outcome::structured`]).

use http::StatusCode;
use std::fmt;

use crate::decode::RequestError;

/// Structured error carrying a status code and its cause.
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::{Error, StatusCode};
///
/// let err = Error::not_found("User", 42);
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.description(), "User with id 42 not found");
/// ```
#[derive(Debug)]
pub struct Error {
    /// HTTP status code
    status: StatusCode,
    /// What went wrong (its message is exposed to the client)
    cause: anyhow::Error,
}

impl Error {
    /// Create a new structured error.
    pub fn new(status: StatusCode, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            cause: cause.into(),
        }
    }

    /// Create a structured error from a plain message.
    pub fn msg(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, anyhow::Error::msg(message.into()))
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::msg(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 401 Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::msg(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a 403 Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::msg(StatusCode::FORBIDDEN, message)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::msg(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
        )
    }

    /// Create a 409 Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::msg(StatusCode::CONFLICT, message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(cause: impl Into<anyhow::Error>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, cause)
    }

    /// Create a 503 Service Unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::msg(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Status code written to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The underlying cause.
    #[must_use]
    pub const fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Consume the error, returning its cause.
    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }

    /// Client-facing description of the error.
    #[must_use]
    pub fn description(&self) -> String {
        self.cause.to_string()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.cause)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Decode and validation failures are the client's fault.
impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Self::new(err.status(), err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("User", "123");
        assert_eq!(err.description(), "User with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_source_is_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::internal(io);

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.source().map(ToString::to_string), Some("disk on fire".to_string()));
    }

    #[test]
    fn test_survives_anyhow_round_trip() {
        let wrapped: anyhow::Error = Error::conflict("already exists").into();
        let back = wrapped.downcast::<Error>().unwrap();

        assert_eq!(back.status(), StatusCode::CONFLICT);
        assert_eq!(back.description(), "already exists");
    }

    #[test]
    fn test_from_request_error_is_bad_request() {
        let decode_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = Error::from(RequestError::Decode(decode_err));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.description().starts_with("could not decode request:"));
    }
}
