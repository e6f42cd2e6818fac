//! Wire envelope.
//!
//! Every reply is written as one of two JSON documents:
//!
//! ```json
//! {"code": 201, "data": {"id": 7}}
//! {"code": 404, "error": "User with id 7 not found"}
//! ```
//!
//! `data` is omitted when the response has no payload. The HTTP status line
//! always equals `code`.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::outcome::Reply;
use crate::response::Response;

/// JSON body written to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// The endpoint failed.
    Failure {
        /// Status code.
        code: u16,
        /// Description of the failure.
        error: String,
    },
    /// The endpoint succeeded.
    Success {
        /// Status code.
        code: u16,
        /// Payload, absent when the endpoint returned none.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
}

impl Envelope {
    /// Envelope for a successful response.
    #[must_use]
    pub fn success(response: &Response) -> Self {
        Self::Success {
            code: response.status().as_u16(),
            data: response.payload().cloned(),
        }
    }

    /// Envelope for a failed request.
    #[must_use]
    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            code: error.status().as_u16(),
            error: error.description(),
        }
    }

    /// Envelope for a translated reply.
    #[must_use]
    pub fn from_reply(reply: &Reply) -> Self {
        match reply {
            Ok(response) => Self::success(response),
            Err(error) => Self::failure(error),
        }
    }

    /// Status code carried by the envelope.
    ///
    /// Falls back to `500` if the code is not a valid status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let (Self::Failure { code, .. } | Self::Success { code, .. }) = self;
        StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether this is a success envelope.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Payload of a success envelope.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Description of a failure envelope.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_payload() {
        let response = Response::new(StatusCode::CREATED, &json!({"id": 7})).unwrap();
        let body = serde_json::to_value(Envelope::success(&response)).unwrap();

        assert_eq!(body, json!({"code": 201, "data": {"id": 7}}));
    }

    #[test]
    fn test_success_without_payload_omits_data() {
        let body = serde_json::to_string(&Envelope::success(&Response::default())).unwrap();
        assert_eq!(body, r#"{"code":200}"#);
    }

    #[test]
    fn test_failure() {
        let body = serde_json::to_value(Envelope::failure(&Error::not_found("User", 7))).unwrap();
        assert_eq!(body, json!({"code": 404, "error": "User with id 7 not found"}));
    }

    #[test]
    fn test_parse_back() {
        let failure: Envelope = serde_json::from_str(r#"{"code":500,"error":"boom"}"#).unwrap();
        assert!(!failure.is_success());
        assert_eq!(failure.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failure.error(), Some("boom"));

        let success: Envelope = serde_json::from_str(r#"{"code":200}"#).unwrap();
        assert!(success.is_success());
        assert!(success.data().is_none());
        assert!(success.error().is_none());
    }

    #[test]
    fn test_from_reply() {
        let reply: Reply = Err(Error::conflict("taken"));
        assert_eq!(
            Envelope::from_reply(&reply),
            Envelope::Failure {
                code: 409,
                error: "taken".into()
            }
        );
    }
}
