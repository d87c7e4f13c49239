//! HTTP middleware and request extractors.
//!
//! Request tracing lives on the router as a `TraceLayer`; what this module
//! adds is authentication: extractors that turn the `Authorization` header
//! into a [`Caller`], plus role-gated wrappers for admin and owner routes.

pub mod auth;

pub use auth::{AdminCaller, AuthRejection, Caller, OwnerCaller};
