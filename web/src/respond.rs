//! Writing envelopes to a [`ResponseSink`].
//!
//! Typed endpoints never call these; the dispatcher does it for them. Raw
//! handlers use them to answer in the same envelope format.

use endpoint_kit_core::{Envelope, Error, Reply, Response};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;

use crate::sink::{ResponseSink, SinkError};

const FALLBACK_BODY: &str = r#"{"code":500,"error":"could not encode response"}"#;

/// Write a success envelope.
///
/// # Errors
///
/// Returns [`SinkError::AlreadyWritten`] if the sink already holds a response.
pub fn with_json(sink: &ResponseSink, response: &Response) -> Result<(), SinkError> {
    write_envelope(sink, response.status(), &Envelope::success(response))
}

/// Write a failure envelope.
///
/// Server errors are logged together with their cause.
///
/// # Errors
///
/// Returns [`SinkError::AlreadyWritten`] if the sink already holds a response.
pub fn with_error(sink: &ResponseSink, error: &Error) -> Result<(), SinkError> {
    if error.status().is_server_error() {
        tracing::error!(
            status = %error.status(),
            error = %error.cause(),
            "Internal server error"
        );
    }

    write_envelope(sink, error.status(), &Envelope::failure(error))
}

/// Write whichever envelope a translated reply calls for.
///
/// # Errors
///
/// Returns [`SinkError::AlreadyWritten`] if the sink already holds a response.
pub fn with_reply(sink: &ResponseSink, reply: &Reply) -> Result<(), SinkError> {
    match reply {
        Ok(response) => with_json(sink, response),
        Err(error) => with_error(sink, error),
    }
}

fn write_envelope(
    sink: &ResponseSink,
    status: StatusCode,
    envelope: &Envelope,
) -> Result<(), SinkError> {
    match serde_json::to_vec(envelope) {
        Ok(body) => {
            sink.write(status, body)?;
        }
        Err(err) => {
            tracing::error!(error = %err, "could not encode response envelope");
            sink.write(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY)?;
        }
    }

    sink.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(())
}
