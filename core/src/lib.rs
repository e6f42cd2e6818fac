//! # Endpoint Kit Core
//!
//! Transport-agnostic building blocks for turning ordinary business functions into
//! uniform request handlers.
//!
//! A business function has a fixed calling shape: it receives a request context, a
//! response sink and a typed request, and returns either just an error or an optional
//! [`Response`] together with an error. This crate holds everything about that shape
//! that does not depend on the HTTP stack:
//!
//! - **Contract**: the [`Signature`] model and the registration-time validator that
//!   rejects malformed shapes with a [`ContractError`]
//! - **Decoding**: [`decode()`] and [`RequestType`], which parse a JSON body into the
//!   declared request type and run its [`Validate`] hook
//! - **Translation**: [`HandlerReturn`] and [`translate()`], which map whatever the
//!   function returned onto exactly one success [`Response`] or structured [`Error`]
//! - **Wire envelope**: [`Envelope`], the JSON document written to the client
//!
//! ## Pipeline
//!
//! ```text
//! register ──► validate_signature ──► Contract { request type, arity }
//!
//! dispatch ──► decode ──► validate ──► call ──► translate ──► Envelope
//!                │           │                      │
//!                └── 400 ────┴──────────────────────┴── 500 / handler status
//! ```
//!
//! The HTTP integration (context, sink, registry, router) lives in
//! `endpoint-kit-web`.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod contract;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod outcome;
pub mod response;
pub mod validate;

pub use contract::{validate_signature, Arity, Contract, ContractError, ParamType, ReturnType, Signature};
pub use decode::{decode, AnyRequest, RequestError, RequestType};
pub use envelope::Envelope;
pub use error::Error;
pub use outcome::{outcome_from_values, structured, translate, HandlerReturn, Outcome, Reply, Returned};
pub use response::Response;
pub use validate::Validate;

pub use http::StatusCode;
