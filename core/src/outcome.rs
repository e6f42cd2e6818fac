//! Translating what an endpoint returned into a single reply.
//!
//! Whatever combination of values a function hands back, exactly one of a
//! success [`Response`] or a structured [`Error`] comes out:
//!
//! | returned                 | reply                               |
//! |--------------------------|-------------------------------------|
//! | `Ok(())`                 | `200`, no payload                   |
//! | `Ok(None)`               | `200`, no payload                   |
//! | `Ok(Some(response))`     | `response` verbatim                 |
//! | `Err(Error { .. })`      | the structured error, unchanged     |
//! | `Err(anything else)`     | `500` wrapping the error            |

use http::StatusCode;

use crate::contract::Arity;
use crate::error::Error;
use crate::response::Response;

/// Result of calling an endpoint, before translation.
pub type Outcome = Result<Option<Response>, anyhow::Error>;

/// Result of translation: what gets written to the client.
pub type Reply = Result<Response, Error>;

/// Return types accepted from typed endpoint functions.
///
/// Implemented for the two shapes of the endpoint contract:
///
/// - `Result<(), E>`: error only
/// - `Result<Option<Response>, E>`: optional response and error
///
/// `E` is anything convertible into [`anyhow::Error`]; returning the structured
/// [`Error`] selects the status code.
pub trait HandlerReturn: Send + 'static {
    /// Which contract shape this is.
    const ARITY: Arity;

    /// Normalize into an [`Outcome`].
    fn into_outcome(self) -> Outcome;
}

impl<E> HandlerReturn for Result<(), E>
where
    E: Into<anyhow::Error> + Send + 'static,
{
    const ARITY: Arity = Arity::ErrorOnly;

    fn into_outcome(self) -> Outcome {
        self.map(|()| None).map_err(Into::into)
    }
}

impl<E> HandlerReturn for Result<Option<Response>, E>
where
    E: Into<anyhow::Error> + Send + 'static,
{
    const ARITY: Arity = Arity::ResponseAndError;

    fn into_outcome(self) -> Outcome {
        self.map_err(Into::into)
    }
}

/// A positional value returned by a dynamically described endpoint.
#[derive(Debug)]
pub enum Returned {
    /// An error slot; `None` means no error.
    Error(Option<anyhow::Error>),
    /// A response slot; `None` means no response.
    Response(Option<Response>),
}

/// Read positional return values according to the validated arity.
///
/// A function that hands back values not matching the arity it declared is
/// treated as a server fault.
#[must_use]
pub fn outcome_from_values(arity: Arity, values: Vec<Returned>) -> Outcome {
    let count = values.len();
    let mut values = values.into_iter();

    match (arity, values.next(), values.next(), values.next()) {
        (Arity::ErrorOnly, Some(Returned::Error(err)), None, None) => err.map_or(Ok(None), Err),
        (Arity::ResponseAndError, Some(Returned::Response(response)), Some(Returned::Error(err)), None) => {
            err.map_or(Ok(response), Err)
        }
        _ => Err(anyhow::anyhow!(
            "endpoint returned {count} value(s) not matching its declared {} return value(s)",
            arity.count()
        )),
    }
}

/// Turn any error into a structured [`Error`].
///
/// A structured error is passed through unchanged; anything else becomes a
/// `500 Internal Server Error` with the original error as cause.
#[must_use]
pub fn structured(err: anyhow::Error) -> Error {
    match err.downcast::<Error>() {
        Ok(structured) => structured,
        Err(other) => Error::new(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

/// Translate an [`Outcome`] into the single [`Reply`] sent to the client.
///
/// # Errors
///
/// Returns the structured error to write when the endpoint failed.
pub fn translate(outcome: Outcome) -> Reply {
    match outcome {
        Ok(Some(response)) => Ok(response),
        Ok(None) => Ok(Response::empty(StatusCode::OK)),
        Err(err) => Err(structured(err)),
    }
}
