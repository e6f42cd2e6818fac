//! Response sink.
//!
//! The [`ResponseSink`] is the byte-writing capability handed to handlers. It
//! accepts exactly one write of a status and body; any later write is refused
//! with [`SinkError::AlreadyWritten`]. Headers can be set by any layer until the
//! router turns the sink into the final HTTP response.

use axum::body::{Body, Bytes};
use axum::response::Response;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Errors from writing to a [`ResponseSink`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// A response was already written for this request.
    #[error("response already written with status {0}")]
    AlreadyWritten(StatusCode),
}

/// Where a handler writes its single response.
///
/// Cloning yields another handle to the same response.
#[derive(Clone, Debug, Default)]
pub struct ResponseSink {
    state: Arc<Mutex<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    headers: HeaderMap,
    written: Option<(StatusCode, Bytes)>,
}

impl ResponseSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a header, replacing existing values.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    /// Add a header value, keeping existing values.
    pub fn append_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.append(name, value);
    }

    /// Snapshot of the headers set so far.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    /// Write the response status and body.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::AlreadyWritten`] if a response was written before;
    /// the earlier response is kept.
    pub fn write(&self, status: StatusCode, body: impl Into<Bytes>) -> Result<(), SinkError> {
        let mut state = self.lock();
        if let Some((written, _)) = &state.written {
            return Err(SinkError::AlreadyWritten(*written));
        }
        state.written = Some((status, body.into()));
        Ok(())
    }

    /// Whether a response was written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.lock().written.is_some()
    }

    /// Status of the written response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.lock().written.as_ref().map(|(status, _)| *status)
    }

    /// Body of the written response.
    #[must_use]
    pub fn body(&self) -> Option<Bytes> {
        self.lock().written.as_ref().map(|(_, body)| body.clone())
    }

    /// Build the HTTP response from what was written.
    ///
    /// A sink nobody wrote to becomes an empty `200 OK`. The sink is emptied;
    /// other clones observe a fresh, unwritten sink afterwards.
    #[must_use]
    pub fn into_response(self) -> Response {
        let SinkState { headers, written } = std::mem::take(&mut *self.lock());
        let (status, body) = written.unwrap_or_else(|| {
            tracing::debug!("handler wrote no response, answering 200");
            (StatusCode::OK, Bytes::new())
        });

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
