//! Successful endpoint responses.

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// A successful result produced by an endpoint.
///
/// Carries the status code written to the client and an optional JSON payload.
/// A `Response` is immutable once built; the dispatcher emits its status and
/// payload verbatim.
///
/// # Examples
///
/// ```
/// use endpoint_kit_core::{Response, StatusCode};
///
/// let created = Response::new(StatusCode::CREATED, &["alice", "bob"]).unwrap();
/// assert_eq!(created.status(), StatusCode::CREATED);
/// assert!(created.payload().is_some());
///
/// let accepted = Response::empty(StatusCode::ACCEPTED);
/// assert!(accepted.payload().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    payload: Option<Value>,
}

impl Response {
    /// Build a response by serializing `payload` to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `payload` cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn new<T>(status: StatusCode, payload: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::from_value(status, serde_json::to_value(payload)?))
    }

    /// Build a `200 OK` response carrying `payload`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `payload` cannot be represented as JSON.
    pub fn ok<T>(payload: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        Self::new(StatusCode::OK, payload)
    }

    /// Build a response from an already serialized JSON value.
    #[must_use]
    pub const fn from_value(status: StatusCode, payload: Value) -> Self {
        Self {
            status,
            payload: Some(payload),
        }
    }

    /// Build a response without payload.
    #[must_use]
    pub const fn empty(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// Status code written to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Split into status and payload.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Option<Value>) {
        (self.status, self.payload)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(StatusCode::OK)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_new_serializes_payload() {
        #[derive(Serialize)]
        struct User {
            id: u32,
            name: &'static str,
        }

        let response = Response::new(StatusCode::CREATED, &User { id: 7, name: "ada" }).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.payload(), Some(&json!({"id": 7, "name": "ada"})));
    }

    #[test]
    fn test_new_rejects_non_string_map_keys() {
        let mut payload = HashMap::new();
        payload.insert(vec![1_u8], "value");

        assert!(Response::new(StatusCode::OK, &payload).is_err());
    }

    #[test]
    fn test_default_is_empty_ok() {
        let response = Response::default();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.payload().is_none());
    }

    #[test]
    fn test_into_parts() {
        let (status, payload) = Response::from_value(StatusCode::ACCEPTED, json!("queued")).into_parts();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(payload, Some(json!("queued")));
    }
}
